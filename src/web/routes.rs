use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::web::handlers::{admin, folders, images, users};
use crate::web::middleware::attach_error_path;
use crate::web::state::AppState;

/// Assembles the full router: the REST API (spec.md §6) plus static image
/// serving nested under `/images`.
pub fn build_router(state: AppState) -> Router {
    let images_root = state.data_root.join("uploads").join("images");

    let api = Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route("/api/users/logout", post(users::logout))
        .route("/api/users/delete", delete(users::delete_account))
        .route("/api/images/upload", post(images::upload))
        .route("/api/images/search", get(images::search))
        .route("/api/folders", get(folders::list).delete(folders::delete))
        .route("/api/folders/share", post(folders::share))
        .route("/api/admin/retry-queue/stats", get(admin::retry_queue_stats))
        .route(
            "/api/admin/retry-queue/trigger-embed-retry",
            post(admin::trigger_embed_retry),
        )
        .route(
            "/api/admin/retry-queue/trigger-index-deletion-retry",
            post(admin::trigger_index_deletion_retry),
        )
        .route("/health", get(images::health));

    Router::new()
        .merge(api)
        .nest_service("/images", ServeDir::new(images_root))
        .layer(middleware::from_fn(attach_error_path))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
