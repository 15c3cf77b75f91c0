use crate::bus::Job;
use crate::errors::PonteError;
use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub const DEFAULT_WORKERS: usize = 4;

/// Fan-out job queue with per-conversation ordering.
///
/// Each worker owns one unbounded channel; jobs are routed to a worker by
/// hashing the conversation key, so two messages from the same conversation
/// are always handled by the same single consumer, in arrival order.
/// Different conversations still run concurrently across workers.
pub struct JobQueue {
    senders: Vec<mpsc::UnboundedSender<Job>>,
}

impl JobQueue {
    /// Spawn `workers` consumer tasks, each draining its own partition
    /// through `handler`.
    pub fn start<F, Fut>(workers: usize, handler: F) -> Self
    where
        F: Fn(Job) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let workers = workers.max(1);
        let mut senders = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
            senders.push(tx);
            let handler = handler.clone();
            tokio::spawn(async move {
                while let Some(job) = rx.recv().await {
                    debug!(
                        "worker {} handling job for {}",
                        worker_id, job.message.conversation_key
                    );
                    handler(job).await;
                }
                debug!("worker {} shutting down", worker_id);
            });
        }
        info!("job queue started with {} workers", workers);
        Self { senders }
    }

    fn partition(&self, conversation_key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        conversation_key.hash(&mut hasher);
        (hasher.finish() as usize) % self.senders.len()
    }

    pub fn enqueue(&self, job: Job) -> Result<(), PonteError> {
        let idx = self.partition(&job.message.conversation_key);
        self.senders[idx]
            .send(job)
            .map_err(|_| PonteError::Internal(anyhow::anyhow!("job queue is shut down")))
    }
}

#[cfg(test)]
mod tests;
