pub mod config;
pub mod identity;
pub mod queue;
pub mod repository_access;
pub mod retry;
pub mod subdomains;

pub use config::{
    ConfigLoader,
    ConfigValidator,
    PagesmithConfig,
    QueueBackend,
};
pub use identity::{
    HeaderIdentityGate,
    IdentityGate,
};
pub use queue::{
    spawn_job_logger,
    ChannelJobQueue,
    JobQueue,
    QueueError,
    QueueResult,
    WebhookJobQueue,
};
pub use repository_access::{
    ProviderError,
    ProviderResult,
    RepositoryAccess,
};
pub use retry::{
    RetryPolicy,
    Retryable,
};
pub use subdomains::{
    OpenSubdomainRegistry,
    ReservedSubdomainRegistry,
    SubdomainRegistry,
};
