use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::configuration::DispatchSettings;
use crate::search::{EmbedImage, EmbedRequest, GuardedSearchClient};

/// One upload's worth of images to embed, assembled by
/// [`crate::pipeline::upload::UploadPipeline`] and handed to the
/// dispatcher after the Image rows are committed (spec.md §4.5, C7).
#[derive(Debug, Clone)]
pub struct EmbeddingTask {
    pub user_id: i64,
    pub folder_id: i64,
    pub images: Vec<EmbedImage>,
}

/// Bounded channel + fixed worker pool draining it. Submitting to a full
/// queue blocks the caller (backpressure), matching spec.md §4.5 and §9's
/// "avoid unbounded spawning" note.
#[derive(Clone)]
pub struct AsyncEmbeddingDispatcher {
    sender: mpsc::Sender<EmbeddingTask>,
}

impl AsyncEmbeddingDispatcher {
    /// Spawns `settings.workers` worker tasks reading from a shared
    /// bounded channel of capacity `settings.queue_capacity`, and returns
    /// the dispatcher handle plus the workers' join handles.
    pub fn spawn(
        settings: DispatchSettings,
        search_client: Arc<GuardedSearchClient>,
    ) -> (Self, Vec<tokio::task::JoinHandle<()>>) {
        let (sender, receiver) = mpsc::channel(settings.queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut handles = Vec::with_capacity(settings.workers);
        for worker_id in 0..settings.workers {
            let receiver = receiver.clone();
            let search_client = search_client.clone();
            let batch_size = settings.batch_size;
            let batch_pause = Duration::from_millis(settings.batch_pause_ms);

            handles.push(tokio::spawn(async move {
                loop {
                    let task = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(task) = task else {
                        info!(worker_id, "embedding dispatcher worker shutting down, channel closed");
                        break;
                    };

                    Self::process_task(worker_id, task, &search_client, batch_size, batch_pause).await;
                }
            }));
        }

        (Self { sender }, handles)
    }

    async fn process_task(
        worker_id: usize,
        task: EmbeddingTask,
        search_client: &GuardedSearchClient,
        batch_size: usize,
        batch_pause: Duration,
    ) {
        let total = task.images.len();
        info!(worker_id, user_id = task.user_id, folder_id = task.folder_id, total, "processing embedding task");

        let mut batches = task.images.chunks(batch_size).peekable();
        while let Some(batch) = batches.next() {
            let req = EmbedRequest {
                user_id: task.user_id,
                folder_id: task.folder_id,
                images: batch.to_vec(),
            };

            search_client.embed_images(req).await;

            if batches.peek().is_some() {
                tokio::time::sleep(batch_pause).await;
            }
        }
    }

    /// Enqueues a task, blocking the caller if the queue is full. This is
    /// the backpressure point upload requests feel under sustained load.
    pub async fn submit(&self, task: EmbeddingTask) {
        if self.sender.send(task).await.is_err() {
            error!("embedding dispatcher channel closed, task dropped");
        }
    }
}
