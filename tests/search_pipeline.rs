mod common;

use std::sync::Arc;

use image_search_orchestrator::access::AccessControl;
use image_search_orchestrator::configuration::BreakerSettings;
use image_search_orchestrator::pipeline::SearchPipeline;
use image_search_orchestrator::repo::{FolderRepo, ImageRepo, ShareRepo};
use image_search_orchestrator::retry::FailedRequestService;
use image_search_orchestrator::search::{build_guarded_client, GuardedSearchClient};
use image_search_orchestrator::configuration::{ActiveSearchBackend, SearchSettings};
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

async fn guarded_client_against(server: &MockServer, pool: sqlx::PgPool) -> Arc<GuardedSearchClient> {
    let search_settings = SearchSettings {
        active_backend: ActiveSearchBackend::Primary,
        primary_search_url: server.uri(),
        backup_search_url: server.uri(),
        request_timeout_s: 5,
    };

    let retry = Arc::new(FailedRequestService::new(
        image_search_orchestrator::repo::RetryQueueRepo::new(pool),
    ));

    Arc::new(build_guarded_client(&search_settings, breaker_settings(), retry))
}

#[tokio::test]
#[serial]
async fn empty_accessible_folder_set_skips_the_remote_call() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "search_empty").await;

    let server = MockServer::start().await;
    // No mock registered for /api/search: if the pipeline calls it, wiremock
    // returns 404 and the test would fail downstream instead of short-circuiting.

    let folders = FolderRepo::new(pool.clone());
    let images = ImageRepo::new(pool.clone());
    let shares = ShareRepo::new(pool.clone());
    let access = AccessControl::new(folders.clone(), shares);
    let search_client = guarded_client_against(&server, pool).await;

    let pipeline = SearchPipeline::new(
        folders,
        images,
        access,
        search_client,
        "http://localhost:8000".to_string(),
    );

    let results = pipeline.search(user_id, "cat", None, 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
#[serial]
async fn happy_search_enriches_remote_hits_with_image_urls() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "search_happy").await;

    let folders = FolderRepo::new(pool.clone());
    let images = ImageRepo::new(pool.clone());
    let shares = ShareRepo::new(pool.clone());
    let access = AccessControl::new(folders.clone(), shares);

    let (folder, _) = folders.get_or_create(user_id, "cats").await.unwrap();
    let image = images
        .insert(user_id, folder.id, "images/1/1/a.jpg")
        .await
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [{"image_id": image.id, "score": 0.92, "folder_id": folder.id}],
            "total": 1,
        })))
        .mount(&server)
        .await;

    let search_client = guarded_client_against(&server, pool).await;

    let pipeline = SearchPipeline::new(
        folders,
        images,
        access,
        search_client,
        "http://localhost:8000".to_string(),
    );

    let results = pipeline
        .search(user_id, "cat", Some(vec![folder.id]), 1)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].url.ends_with("/images/1/1/a.jpg"));
    assert!((results[0].similarity - 0.92).abs() < f64::EPSILON);
}

#[tokio::test]
#[serial]
async fn remote_failure_surfaces_as_service_unavailable_not_an_internal_error() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "search_down").await;

    let folders = FolderRepo::new(pool.clone());
    let images = ImageRepo::new(pool.clone());
    let shares = ShareRepo::new(pool.clone());
    let access = AccessControl::new(folders.clone(), shares);

    let (folder, _) = folders.get_or_create(user_id, "cats").await.unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let search_client = guarded_client_against(&server, pool).await;

    let pipeline = SearchPipeline::new(
        folders,
        images,
        access,
        search_client,
        "http://localhost:8000".to_string(),
    );

    let err = pipeline
        .search(user_id, "cat", Some(vec![folder.id]), 1)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        image_search_orchestrator::error::AppError::ServiceUnavailable
    ));
}
