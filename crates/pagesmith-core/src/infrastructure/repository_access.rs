use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use crate::domain::{
    RepositoryMetadata,
    RepositoryReference,
};

/// Why the source-control provider did not confirm access.
///
/// These distinctions are for logs. Callers of the intake pipeline only ever
/// see a single "not found or no access" outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Repository not found")]
    NotFound,

    #[error("Access forbidden")]
    Forbidden,

    #[error("Token rejected")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Source-control provider queried on behalf of the caller.
#[async_trait]
pub trait RepositoryAccess: Send + Sync {
    /// Fetches repository metadata using the caller's token. Success means the
    /// repository exists and the token can read it.
    async fn get_repository(
        &self, reference: &RepositoryReference, token: &SecretString,
    ) -> ProviderResult<RepositoryMetadata>;

    fn provider_name(&self) -> &'static str;
}
