use std::sync::Arc;

use image_search_orchestrator::access::AccessControl;
use image_search_orchestrator::configuration::{get_configuration, ActiveSearchBackend};
use image_search_orchestrator::database::{get_connection_pool, migrate_database};
use image_search_orchestrator::dispatch::AsyncEmbeddingDispatcher;
use image_search_orchestrator::pipeline::{SearchPipeline, UploadPipeline};
use image_search_orchestrator::repo::{FolderRepo, ImageRepo, RetryQueueRepo, SessionRepo, ShareRepo, UserRepo};
use image_search_orchestrator::retry::{FailedRequestService, RetryScheduler};
use image_search_orchestrator::search::{build_guarded_client, BackupSearchClient, PrimarySearchClient, SearchClient};
use image_search_orchestrator::telemetry::init_tracing;
use image_search_orchestrator::web::{build_router, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = get_configuration().expect("failed to read configuration");

    let pool = get_connection_pool(&settings)
        .await
        .expect("failed to connect to database");
    migrate_database(&pool).await.expect("failed to run migrations");

    tokio::fs::create_dir_all(&settings.application.data_root)
        .await
        .expect("data root is not writable");

    let users = UserRepo::new(pool.clone());
    let sessions = SessionRepo::new(pool.clone());
    let folders = FolderRepo::new(pool.clone());
    let images = ImageRepo::new(pool.clone());
    let shares = ShareRepo::new(pool.clone());
    let retry_repo = RetryQueueRepo::new(pool.clone());

    let access = AccessControl::new(folders.clone(), shares.clone());
    let retry_service = Arc::new(FailedRequestService::new(retry_repo.clone()));

    let guarded_search_client = Arc::new(build_guarded_client(
        &settings.search,
        settings.breaker.clone(),
        retry_service.clone(),
    ));

    // The retry scheduler re-invokes C1 directly rather than through the
    // breaker-guarded wrapper: its own failure handling (increment
    // retry-count, revert to PENDING) already absorbs transient errors.
    let bare_search_client: Arc<dyn SearchClient> = match settings.search.active_backend {
        ActiveSearchBackend::Primary => Arc::new(PrimarySearchClient::new(
            settings.search.primary_search_url.clone(),
            settings.search.request_timeout(),
        )),
        ActiveSearchBackend::Backup => Arc::new(BackupSearchClient::new(
            settings.search.backup_search_url.clone(),
            settings.search.request_timeout(),
        )),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let retry_scheduler = Arc::new(RetryScheduler::new(
        retry_repo,
        bare_search_client,
        settings.retry.clone(),
        shutdown_rx.clone(),
    ));

    let (dispatcher, _dispatch_workers) =
        AsyncEmbeddingDispatcher::spawn(settings.dispatch.clone(), guarded_search_client.clone());

    let upload_pipeline = UploadPipeline::new(
        folders.clone(),
        images.clone(),
        dispatcher.clone(),
        guarded_search_client.clone(),
        std::path::PathBuf::from(&settings.application.data_root),
        settings.upload.allowed_extensions.clone(),
    );

    let search_pipeline = SearchPipeline::new(
        folders.clone(),
        images.clone(),
        access.clone(),
        guarded_search_client.clone(),
        settings.application.base_url.clone(),
    );

    let state = AppState::new(
        &settings,
        users,
        sessions.clone(),
        folders,
        images,
        shares,
        access,
        guarded_search_client,
        retry_service,
        retry_scheduler.clone(),
        upload_pipeline,
        search_pipeline,
        dispatcher,
    );

    let _retry_loops = retry_scheduler.clone().spawn();
    let _session_sweep = spawn_session_sweep(sessions, shutdown_rx);

    let app = build_router(state);

    let addr = std::net::SocketAddr::from((
        settings
            .application
            .host
            .parse::<std::net::IpAddr>()
            .unwrap_or_else(|_| [0, 0, 0, 0].into()),
        settings.application.port,
    ));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = shutdown_tx.send(true);
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    result.map_err(Into::into)
}

/// Periodic sweep of expired sessions (spec.md §4.8).
fn spawn_session_sweep(
    sessions: SessionRepo,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = sessions.delete_expired(chrono::Utc::now()).await {
                        tracing::error!(error = %e, "session sweep failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    info!("shutdown signal received");
}
