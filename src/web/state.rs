use std::sync::Arc;

use crate::access::AccessControl;
use crate::configuration::{SessionSettings, Settings, UploadSettings};
use crate::dispatch::AsyncEmbeddingDispatcher;
use crate::pipeline::{SearchPipeline, UploadPipeline};
use crate::repo::{FolderRepo, ImageRepo, SessionRepo, ShareRepo, UserRepo};
use crate::retry::{FailedRequestService, RetryScheduler};
use crate::search::GuardedSearchClient;

/// Everything a handler needs, assembled once in `main` and shared via
/// axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepo,
    pub sessions: SessionRepo,
    pub folders: FolderRepo,
    pub images: ImageRepo,
    pub shares: ShareRepo,
    pub access: AccessControl,
    pub search_client: Arc<GuardedSearchClient>,
    pub retry: Arc<FailedRequestService>,
    pub retry_scheduler: Arc<RetryScheduler>,
    pub upload_pipeline: UploadPipeline,
    pub search_pipeline: SearchPipeline,
    pub dispatcher: AsyncEmbeddingDispatcher,
    pub session_settings: SessionSettings,
    pub upload_settings: UploadSettings,
    pub data_root: std::path::PathBuf,
    pub base_url: String,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: &Settings,
        users: UserRepo,
        sessions: SessionRepo,
        folders: FolderRepo,
        images: ImageRepo,
        shares: ShareRepo,
        access: AccessControl,
        search_client: Arc<GuardedSearchClient>,
        retry: Arc<FailedRequestService>,
        retry_scheduler: Arc<RetryScheduler>,
        upload_pipeline: UploadPipeline,
        search_pipeline: SearchPipeline,
        dispatcher: AsyncEmbeddingDispatcher,
    ) -> Self {
        Self {
            users,
            sessions,
            folders,
            images,
            shares,
            access,
            search_client,
            retry,
            retry_scheduler,
            upload_pipeline,
            search_pipeline,
            dispatcher,
            session_settings: settings.session.clone(),
            upload_settings: settings.upload.clone(),
            data_root: std::path::PathBuf::from(&settings.application.data_root),
            base_url: settings.application.base_url.clone(),
        }
    }
}
