pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod logging;

use std::sync::Arc;

use anyhow::Context;

pub use application::{
    DeploymentService,
    JobSubmitter,
    PipelineStage,
};
pub use domain::{
    Credentials,
    DeployError,
    DeployResult,
    DeploymentAccepted,
    DeploymentDetails,
    DeploymentJob,
    DeploymentRequest,
    RepositoryMetadata,
    RepositoryReference,
    RepositoryUrlParser,
    Session,
    SubdomainLabel,
};
pub use infrastructure::{
    ConfigLoader,
    ConfigValidator,
    HeaderIdentityGate,
    IdentityGate,
    JobQueue,
    PagesmithConfig,
    ProviderError,
    ProviderResult,
    QueueBackend,
    RepositoryAccess,
    RetryPolicy,
    SubdomainRegistry,
};
use tokio::task::JoinHandle;

/// Everything a front end needs to accept deployments, wired from config.
pub struct CoreContext {
    pub deployment_service: Arc<DeploymentService>,

    pub config: PagesmithConfig,

    worker: Option<JoinHandle<()>>,
}

impl CoreContext {
    /// Builds the pipeline around `repositories`.
    ///
    /// The memory backend spawns a local consumer that logs each job, so this
    /// must be called from within a Tokio runtime.
    pub fn from_config(
        config: PagesmithConfig, repositories: Arc<dyn RepositoryAccess>,
    ) -> anyhow::Result<Self> {
        let (queue, worker) = match config.queue.backend {
            QueueBackend::Memory => {
                let (queue, receiver) =
                    infrastructure::ChannelJobQueue::new(config.queue.capacity);
                (
                    Arc::new(queue) as Arc<dyn JobQueue>,
                    Some(infrastructure::spawn_job_logger(receiver)),
                )
            }
            QueueBackend::Webhook => {
                let url = config
                    .queue
                    .webhook_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("queue.webhook_url is required"))?;
                let queue =
                    infrastructure::WebhookJobQueue::new(url, config.queue.request_timeout())?;
                (Arc::new(queue) as Arc<dyn JobQueue>, None)
            }
        };

        let subdomains: Arc<dyn SubdomainRegistry> =
            if config.deploy.reserved_subdomains.is_empty() {
                Arc::new(infrastructure::OpenSubdomainRegistry)
            } else {
                let registry = infrastructure::ReservedSubdomainRegistry::new(
                    config.deploy.reserved_subdomains.iter().cloned(),
                );
                tracing::info!(reserved = registry.reserved_count(), "Reserved subdomains loaded");
                Arc::new(registry)
            };

        let url_parser =
            RepositoryUrlParser::for_host(RepositoryUrlParser::host_of(&config.github.base_url))
                .context("Invalid github.base_url host")?;

        let identity: Arc<dyn IdentityGate> = Arc::new(HeaderIdentityGate::new(
            config.identity.trust_forwarded_headers,
        ));

        let retry_policy = RetryPolicy::new(
            config.queue.max_attempts,
            config.queue.retry_delay(),
            true,
        );
        let submitter = JobSubmitter::new(queue, &config.deploy.base_domain)
            .with_retry_policy(retry_policy);

        let deployment_service = Arc::new(
            DeploymentService::new(identity, repositories, subdomains, submitter)
                .with_url_parser(url_parser)
                .with_resolve_timeout(config.github.timeout()),
        );

        tracing::info!(
            queue_backend = %config.queue.backend,
            base_domain = %deployment_service.submitter().base_domain(),
            provider = deployment_service.provider_name(),
            "Deployment pipeline initialized"
        );

        Ok(Self {
            deployment_service,
            config,
            worker,
        })
    }

    pub async fn shutdown(mut self) {
        // Dropping the service closes the channel once no handler holds it.
        drop(self.deployment_service);
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "Job consumer ended abnormally");
            }
        }
    }
}
