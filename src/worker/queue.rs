//! Task queue between the HTTP side and the generation worker.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::models::generation::GenerationTask;

/// How long a publish waits for room in a full queue.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("worker queue is closed")]
    Closed,

    #[error("worker queue stayed full for {0:?}")]
    Full(Duration),
}

/// Hands generation tasks to whatever runs them.
#[async_trait]
pub trait TaskPublisher: Send + Sync {
    async fn publish(&self, task: GenerationTask) -> Result<(), PublishError>;
}

/// Publisher backed by a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<GenerationTask>,
}

/// Create a publisher and the receiving end a worker consumes.
pub fn channel(capacity: usize) -> (ChannelPublisher, mpsc::Receiver<GenerationTask>) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (ChannelPublisher { sender }, receiver)
}

#[async_trait]
impl TaskPublisher for ChannelPublisher {
    async fn publish(&self, task: GenerationTask) -> Result<(), PublishError> {
        let generation_id = task.generation_id;
        self.sender
            .send_timeout(task, PUBLISH_TIMEOUT)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Closed(_) => PublishError::Closed,
                SendTimeoutError::Timeout(_) => PublishError::Full(PUBLISH_TIMEOUT),
            })?;

        tracing::info!("Task for generation {} sent to queue", generation_id);
        Ok(())
    }
}
