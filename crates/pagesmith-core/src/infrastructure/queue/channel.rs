use async_trait::async_trait;
use tokio::sync::mpsc::{
    self,
    error::TrySendError,
};
use tokio::task::JoinHandle;

use super::{
    JobQueue,
    QueueError,
    QueueResult,
};
use crate::domain::DeploymentJob;

/// In-process bounded queue. Jobs are drained by whoever holds the receiver.
#[derive(Clone)]
pub struct ChannelJobQueue {
    sender: mpsc::Sender<DeploymentJob>,
}

impl ChannelJobQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<DeploymentJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl JobQueue for ChannelJobQueue {
    async fn submit(&self, job: DeploymentJob) -> QueueResult<()> {
        match self.sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(QueueError::Full),
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Drains the receiver and logs each job. Stands in for a build system when
/// none is attached.
pub fn spawn_job_logger(mut receiver: mpsc::Receiver<DeploymentJob>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = receiver.recv().await {
            tracing::info!(
                owner = %job.owner(),
                repo = %job.repo(),
                subdomain = %job.subdomain,
                requested_by = job.requested_by.as_deref().unwrap_or("unknown"),
                requested_at = %job.requested_at,
                "Queued deployment job received"
            );
        }
        tracing::debug!("Deployment job channel closed");
    })
}
