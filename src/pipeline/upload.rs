use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use crate::dispatch::{AsyncEmbeddingDispatcher, EmbeddingTask};
use crate::domain::Image;
use crate::error::{AppError, AppResult};
use crate::repo::{FolderRepo, ImageRepo};
use crate::search::{EmbedImage, GuardedSearchClient};

/// One uploaded file as extracted from the multipart body, before any
/// validation.
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Result of a single upload request (spec.md §4.6 step 5).
pub struct UploadOutcome {
    pub folder_id: i64,
    pub uploaded_count: usize,
}

/// Orchestrates file write, metadata insert, and dispatch to C7 (spec.md
/// §4.6, C8).
#[derive(Clone)]
pub struct UploadPipeline {
    folders: FolderRepo,
    images: ImageRepo,
    dispatcher: AsyncEmbeddingDispatcher,
    search_client: Arc<GuardedSearchClient>,
    data_root: PathBuf,
    allowed_extensions: Vec<String>,
}

impl UploadPipeline {
    pub fn new(
        folders: FolderRepo,
        images: ImageRepo,
        dispatcher: AsyncEmbeddingDispatcher,
        search_client: Arc<GuardedSearchClient>,
        data_root: PathBuf,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            folders,
            images,
            dispatcher,
            search_client,
            data_root,
            allowed_extensions,
        }
    }

    pub async fn upload(
        &self,
        user_id: i64,
        folder_name: &str,
        files: Vec<UploadedFile>,
    ) -> AppResult<UploadOutcome> {
        if files.is_empty() {
            return Err(AppError::Validation("at least one file is required".into()));
        }

        for file in &files {
            if !self.has_allowed_extension(&file.filename) {
                return Err(AppError::Validation(format!(
                    "file {} has an unsupported extension",
                    file.filename
                )));
            }
        }

        let (folder, created) = self
            .folders
            .get_or_create(user_id, folder_name)
            .await
            .map_err(AppError::Internal)?;

        if created {
            self.search_client.create_index(user_id, folder.id).await;
        }

        let mut embed_images = Vec::with_capacity(files.len());
        for file in files {
            let relative_filepath = Image::relative_path(user_id, folder.id, &file.filename);
            self.write_file(&relative_filepath, &file.bytes).await?;

            let image = self
                .images
                .insert(user_id, folder.id, &relative_filepath)
                .await
                .map_err(AppError::Internal)?;

            embed_images.push(EmbedImage {
                image_id: image.id,
                file_path: image.relative_filepath,
            });
        }

        let uploaded_count = embed_images.len();

        info!(user_id, folder_id = folder.id, uploaded_count, "dispatching embedding task");
        self.dispatcher
            .submit(EmbeddingTask {
                user_id,
                folder_id: folder.id,
                images: embed_images,
            })
            .await;

        Ok(UploadOutcome {
            folder_id: folder.id,
            uploaded_count,
        })
    }

    fn has_allowed_extension(&self, filename: &str) -> bool {
        let Some(ext) = filename.rsplit('.').next() else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }

    /// Writes bytes to `{data_root}/uploads/{relative_filepath}`, creating
    /// directories as needed. Overwrites are permitted (spec.md §4.6 step 3).
    async fn write_file(&self, relative_filepath: &str, bytes: &Bytes) -> AppResult<()> {
        let full_path = self.data_root.join("uploads").join(relative_filepath);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
        }

        tokio::fs::write(&full_path, bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(())
    }
}
