//! Background generation worker.
//!
//! The worker drains the task queue one task at a time:
//! 1. Reject tasks without text
//! 2. Mark the generation PROCESSING
//! 3. Synthesize audio
//! 4. Mark DONE with the audio location, or FAILED on any error

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::models::generation::GenerationTask;
use crate::models::transaction::Status;
use crate::store::Store;
use synth::Synthesizer;

pub mod queue;
pub mod synth;

pub struct GenerationWorker {
    id: String,
    store: Arc<dyn Store>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl GenerationWorker {
    pub fn new(
        id: impl Into<String>,
        store: Arc<dyn Store>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            id: id.into(),
            store,
            synthesizer,
        }
    }

    /// Consume tasks until every publisher has been dropped.
    pub async fn run(self, mut tasks: mpsc::Receiver<GenerationTask>) {
        tracing::info!("Worker {} waiting for tasks...", self.id);
        while let Some(task) = tasks.recv().await {
            self.handle(task).await;
        }
        tracing::info!("Worker {} stopped", self.id);
    }

    /// Process one task and return the status the generation ended in.
    pub async fn handle(&self, task: GenerationTask) -> Status {
        tracing::info!(
            "Worker {} received task {} for generation {}",
            self.id,
            task.task_id,
            task.generation_id
        );

        if task.text.trim().is_empty() {
            tracing::error!("Invalid task data for generation {}: empty text", task.generation_id);
            self.mark(&task, Status::Failed, None).await;
            return Status::Failed;
        }

        self.mark(&task, Status::Processing, None).await;

        match self.synthesizer.synthesize(&task).await {
            Ok(path) => {
                let link = path.to_string_lossy().into_owned();
                self.mark(&task, Status::Done, Some(link)).await;
                tracing::info!("Task {} completed by {}", task.generation_id, self.id);
                Status::Done
            }
            Err(e) => {
                tracing::error!("Audio generation failed for {}: {}", task.generation_id, e);
                self.mark(&task, Status::Failed, None).await;
                Status::Failed
            }
        }
    }

    async fn mark(&self, task: &GenerationTask, status: Status, link: Option<String>) {
        match self.store.update_generation(task.generation_id, status, link).await {
            Ok(true) => tracing::info!("Updated generation {} status to {}", task.generation_id, status),
            Ok(false) => tracing::error!("Generation {} not found", task.generation_id),
            Err(e) => tracing::error!("Failed to update generation status: {}", e),
        }
    }
}

/// Start a worker on the current runtime.
pub fn spawn(
    worker: GenerationWorker,
    tasks: mpsc::Receiver<GenerationTask>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(worker.run(tasks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::generation::NewGeneration;
    use crate::models::user::NewUser;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use uuid::Uuid;

    struct BrokenSynthesizer;

    #[async_trait]
    impl Synthesizer for BrokenSynthesizer {
        async fn synthesize(&self, _task: &GenerationTask) -> Result<PathBuf, AppError> {
            Err(AppError::Io(std::io::Error::other("model unavailable")))
        }
    }

    async fn pending_generation(store: &MemoryStore, text: &str) -> GenerationTask {
        let user = store
            .insert_user(NewUser {
                email: format!("{}@example.com", Uuid::new_v4().simple()),
                password_hash: "salt$digest".to_string(),
                initial_balance: 100.0,
            })
            .await
            .unwrap();
        let generation = store
            .insert_generation(NewGeneration {
                id: Uuid::new_v4(),
                user_id: user.id,
                text: text.to_string(),
                tokens_spent: 2,
            })
            .await
            .unwrap();
        GenerationTask::new(&generation)
    }

    #[tokio::test]
    async fn successful_task_stores_audio_link() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let task = pending_generation(&store, "hello world").await;
        let worker = GenerationWorker::new(
            "worker-test",
            store.clone(),
            Arc::new(synth::ToneSynthesizer::new(dir.path())),
        );

        assert_eq!(worker.handle(task.clone()).await, Status::Done);

        let stored = store.find_generation(task.generation_id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Done);
        let link = PathBuf::from(stored.s3_link.unwrap());
        assert!(link.exists());
    }

    #[tokio::test]
    async fn synthesis_error_marks_failed() {
        let store = Arc::new(MemoryStore::new());
        let task = pending_generation(&store, "hello world").await;
        let worker =
            GenerationWorker::new("worker-test", store.clone(), Arc::new(BrokenSynthesizer));

        assert_eq!(worker.handle(task.clone()).await, Status::Failed);
        let stored = store.find_generation(task.generation_id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Failed);
        assert!(stored.s3_link.is_none());
    }

    #[tokio::test]
    async fn empty_text_is_marked_failed() {
        let store = Arc::new(MemoryStore::new());
        let task = pending_generation(&store, "   ").await;
        let worker =
            GenerationWorker::new("worker-test", store.clone(), Arc::new(BrokenSynthesizer));

        assert_eq!(worker.handle(task.clone()).await, Status::Failed);
        let stored = store.find_generation(task.generation_id).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Failed);
        assert!(stored.s3_link.is_none());
    }
}
