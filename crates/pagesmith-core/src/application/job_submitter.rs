use std::sync::Arc;

use crate::domain::{
    DeployError,
    DeployResult,
    DeploymentAccepted,
    DeploymentDetails,
    DeploymentJob,
    SubdomainLabel,
};
use crate::infrastructure::{
    JobQueue,
    RetryPolicy,
};

/// Hands validated jobs to the queue and predicts where the site will live.
pub struct JobSubmitter {
    queue: Arc<dyn JobQueue>,
    base_domain: String,
    retry_policy: RetryPolicy,
}

impl JobSubmitter {
    pub fn new(queue: Arc<dyn JobQueue>, base_domain: impl AsRef<str>) -> Self {
        Self {
            queue,
            base_domain: normalize_domain(base_domain.as_ref()),
            retry_policy: RetryPolicy::none(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn backend_name(&self) -> &'static str {
        self.queue.backend_name()
    }

    pub fn deployment_url(&self, subdomain: &SubdomainLabel) -> String {
        format!("https://{}.{}", subdomain, self.base_domain)
    }

    /// Queues `job`. Retryable queue failures are retried according to the
    /// policy; a final failure becomes [`DeployError::SubmissionFailed`].
    pub async fn submit(&self, job: DeploymentJob) -> DeployResult<DeploymentAccepted> {
        let accepted = DeploymentAccepted {
            deployment_url: self.deployment_url(&job.subdomain),
            details: DeploymentDetails {
                owner: job.owner().to_string(),
                repo: job.repo().to_string(),
                subdomain: job.subdomain.to_string(),
            },
        };

        let result = self
            .retry_policy
            .retry(|| {
                let queue = Arc::clone(&self.queue);
                let job = job.clone();
                async move { queue.submit(job).await }
            })
            .await;

        match result {
            Ok(()) => Ok(accepted),
            Err(e) => {
                tracing::warn!(
                    backend = self.queue.backend_name(),
                    owner = %accepted.details.owner,
                    repo = %accepted.details.repo,
                    subdomain = %accepted.details.subdomain,
                    error = %e,
                    "Failed to queue deployment job"
                );
                Err(DeployError::SubmissionFailed)
            }
        }
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_matches('.').to_lowercase()
}
