mod common;

use std::sync::Arc;

use bytes::Bytes;
use image_search_orchestrator::configuration::{ActiveSearchBackend, DispatchSettings, SearchSettings};
use image_search_orchestrator::configuration::BreakerSettings;
use image_search_orchestrator::dispatch::AsyncEmbeddingDispatcher;
use image_search_orchestrator::pipeline::upload::UploadedFile;
use image_search_orchestrator::pipeline::UploadPipeline;
use image_search_orchestrator::repo::{FolderRepo, ImageRepo};
use image_search_orchestrator::retry::FailedRequestService;
use image_search_orchestrator::search::build_guarded_client;
use serial_test::serial;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn breaker_settings() -> BreakerSettings {
    BreakerSettings {
        window: 10,
        minimum_calls: 5,
        failure_rate_threshold: 0.5,
        slow_call_duration_s: 10,
        slow_call_rate_threshold: 0.5,
        open_duration_s: 60,
        half_open_probes: 2,
    }
}

#[tokio::test]
#[serial]
async fn upload_writes_file_inserts_row_and_dispatches_embedding() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "uploader").await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed-images"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/create-index"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let search_settings = SearchSettings {
        active_backend: ActiveSearchBackend::Primary,
        primary_search_url: server.uri(),
        backup_search_url: server.uri(),
        request_timeout_s: 5,
    };

    let retry = Arc::new(FailedRequestService::new(
        image_search_orchestrator::repo::RetryQueueRepo::new(pool.clone()),
    ));
    let search_client = Arc::new(build_guarded_client(&search_settings, breaker_settings(), retry));

    let (dispatcher, _workers) = AsyncEmbeddingDispatcher::spawn(
        DispatchSettings {
            workers: 1,
            queue_capacity: 8,
            batch_size: 32,
            batch_pause_ms: 1,
        },
        search_client.clone(),
    );

    let data_root = std::env::temp_dir().join(format!("orchestrator-test-{user_id}"));
    let _ = tokio::fs::remove_dir_all(&data_root).await;

    let folders = FolderRepo::new(pool.clone());
    let images = ImageRepo::new(pool.clone());

    let pipeline = UploadPipeline::new(
        folders,
        images.clone(),
        dispatcher,
        search_client,
        data_root.clone(),
        vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
    );

    let outcome = pipeline
        .upload(
            user_id,
            "cats",
            vec![UploadedFile {
                filename: "a.jpg".to_string(),
                bytes: Bytes::from_static(b"fake jpeg bytes"),
            }],
        )
        .await
        .unwrap();

    assert_eq!(outcome.uploaded_count, 1);

    let rows = images.list_by_folder(outcome.folder_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].relative_filepath,
        format!("images/{user_id}/{}/a.jpg", outcome.folder_id)
    );

    let written = data_root
        .join("uploads")
        .join(&rows[0].relative_filepath);
    assert!(tokio::fs::metadata(&written).await.is_ok());

    let _ = tokio::fs::remove_dir_all(&data_root).await;
}

#[tokio::test]
#[serial]
async fn upload_with_disallowed_extension_is_rejected_and_writes_nothing() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "uploader_bad_ext").await;

    let server = MockServer::start().await;
    let search_settings = SearchSettings {
        active_backend: ActiveSearchBackend::Primary,
        primary_search_url: server.uri(),
        backup_search_url: server.uri(),
        request_timeout_s: 5,
    };
    let retry = Arc::new(FailedRequestService::new(
        image_search_orchestrator::repo::RetryQueueRepo::new(pool.clone()),
    ));
    let search_client = Arc::new(build_guarded_client(&search_settings, breaker_settings(), retry));
    let (dispatcher, _workers) = AsyncEmbeddingDispatcher::spawn(
        DispatchSettings {
            workers: 1,
            queue_capacity: 8,
            batch_size: 32,
            batch_pause_ms: 1,
        },
        search_client.clone(),
    );

    let data_root = std::env::temp_dir().join(format!("orchestrator-test-bad-{user_id}"));
    let _ = tokio::fs::remove_dir_all(&data_root).await;

    let folders = FolderRepo::new(pool.clone());
    let images = ImageRepo::new(pool.clone());

    let pipeline = UploadPipeline::new(
        folders,
        images,
        dispatcher,
        search_client,
        data_root.clone(),
        vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
    );

    let result = pipeline
        .upload(
            user_id,
            "cats",
            vec![
                UploadedFile {
                    filename: "a.jpg".to_string(),
                    bytes: Bytes::from_static(b"ok"),
                },
                UploadedFile {
                    filename: "malware.exe".to_string(),
                    bytes: Bytes::from_static(b"bad"),
                },
            ],
        )
        .await;

    assert!(result.is_err());
    assert!(tokio::fs::metadata(&data_root).await.is_err());
}
