//! Endpoint resolution for github.com and GitHub Enterprise

use pagesmith_core::infrastructure::config::GitHubConfig;

pub(crate) const GITHUB_COM_API: &str = "https://api.github.com";

/// Web base URL from configuration, defaulting to GitHub.com
pub(crate) fn get_base_url(config: &GitHubConfig) -> String {
    let trimmed = config.base_url.trim();
    if trimmed.is_empty() {
        "https://github.com".to_string()
    } else {
        trimmed.trim_end_matches('/').to_string()
    }
}

/// Builds the API URL from the base URL
pub(crate) fn build_api_url(base_url: &str) -> String {
    // GitHub Enterprise uses /api/v3, while GitHub.com uses api.github.com
    if base_url.contains("github.com") && !base_url.contains("api.github.com") {
        GITHUB_COM_API.to_string()
    } else if base_url.ends_with("/api/v3") || base_url.contains("api.github.com") {
        base_url.trim_end_matches('/').to_string()
    } else {
        format!("{}/api/v3", base_url.trim_end_matches('/'))
    }
}
