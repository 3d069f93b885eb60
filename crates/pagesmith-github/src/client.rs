use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use octocrab::Octocrab;
use pagesmith_core::infrastructure::config::GitHubConfig;
use pagesmith_core::{
    ProviderError,
    ProviderResult,
    RepositoryAccess,
    RepositoryMetadata,
    RepositoryReference,
};
use secrecy::{
    ExposeSecret,
    SecretString,
};
use tracing::debug;

use crate::config;

/// Confirms repository access by fetching it with the caller's own token.
///
/// A fresh client is built per lookup so no token outlives its request.
pub struct GitHubRepositoryAccess {
    api_url: String,
    timeout: Duration,
}

impl GitHubRepositoryAccess {
    pub fn new(config: &GitHubConfig) -> Self {
        let base_url = config::get_base_url(config);
        Self {
            api_url: config::build_api_url(&base_url),
            timeout: config.timeout(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn client(&self, token: &SecretString) -> ProviderResult<Octocrab> {
        Octocrab::builder()
            .personal_token(token.expose_secret().to_owned())
            .set_connect_timeout(Some(self.timeout))
            .set_read_timeout(Some(self.timeout))
            .base_uri(self.api_url.as_str())
            .map_err(|e| ProviderError::Api(format!("Invalid GitHub API URL: {e}")))?
            .build()
            .map_err(|e| ProviderError::Network(format!("Failed to build GitHub client: {e}")))
    }
}

#[async_trait]
impl RepositoryAccess for GitHubRepositoryAccess {
    async fn get_repository(
        &self, reference: &RepositoryReference, token: &SecretString,
    ) -> ProviderResult<RepositoryMetadata> {
        let octocrab = self.client(token)?;

        debug!(repository = %reference, api_url = %self.api_url, "Fetching repository");

        let repository = octocrab
            .repos(reference.owner(), reference.repo())
            .get()
            .await
            .map_err(classify_error)?;

        Ok(RepositoryMetadata {
            full_name: repository.full_name,
            private: repository.private,
            default_branch: repository.default_branch,
        })
    }

    fn provider_name(&self) -> &'static str {
        "github"
    }
}

fn classify_error(error: octocrab::Error) -> ProviderError {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            classify_status(source.status_code, &source.message)
        }
        octocrab::Error::Serde { .. } | octocrab::Error::Json { .. } => {
            ProviderError::Api(format!("Unexpected GitHub response: {error}"))
        }
        other => ProviderError::Network(other.to_string()),
    }
}

fn classify_status(status: StatusCode, message: &str) -> ProviderError {
    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound,
        StatusCode::UNAUTHORIZED => ProviderError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        // Exhausted primary rate limits come back as 403 with this message
        StatusCode::FORBIDDEN if message.to_lowercase().contains("rate limit") => {
            ProviderError::RateLimited
        }
        StatusCode::FORBIDDEN => ProviderError::Forbidden,
        other => ProviderError::Api(format!("HTTP {}: {}", other.as_u16(), message)),
    }
}
