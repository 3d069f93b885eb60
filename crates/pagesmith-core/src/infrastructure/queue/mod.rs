mod channel;
mod webhook;

use async_trait::async_trait;
use thiserror::Error;

pub use channel::{
    spawn_job_logger,
    ChannelJobQueue,
};
pub use webhook::WebhookJobQueue;

use super::retry::Retryable;
use crate::domain::DeploymentJob;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue is full")]
    Full,

    #[error("Queue is closed")]
    Closed,

    #[error("Queue back end unavailable: {0}")]
    Unavailable(String),

    #[error("Queue back end rejected the job: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Retryable for QueueError {
    fn is_retryable(&self) -> bool {
        matches!(self, QueueError::Full | QueueError::Unavailable(_))
    }
}

pub type QueueResult<T> = Result<T, QueueError>;

/// Back end that accepts deployment jobs for the build system.
///
/// `submit` resolves once the back end has acknowledged the job; it does not
/// wait for the deployment itself. Ownership of the job moves to the queue.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn submit(&self, job: DeploymentJob) -> QueueResult<()>;

    fn backend_name(&self) -> &'static str;
}
