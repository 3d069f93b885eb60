use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    DeployError,
    DeployResult,
};

pub const DEFAULT_REPOSITORY_HOST: &str = "github.com";

const SEGMENT: &str = r"([^/?#\s]+)";

static GITHUB_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com/([^/?#\s]+)/([^/?#\s]+)").expect("Invalid regex pattern")
});

const GIT_SUFFIX: &str = ".git";

/// Owner and repository name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryReference {
    owner: String,
    repo: String,
}

impl RepositoryReference {
    /// Extracts `owner/repo` from anything containing `github.com/<owner>/<repo>`.
    ///
    /// Only the first two path segments after the host are used, so
    /// `https://github.com/alice/site/tree/main` resolves to `alice/site`.
    /// Trailing `.git` suffixes are removed from the repository name.
    pub fn parse(url: &str) -> DeployResult<Self> {
        Self::from_match(&GITHUB_URL_PATTERN, url)
    }

    fn from_match(pattern: &Regex, url: &str) -> DeployResult<Self> {
        let captures = pattern
            .captures(url)
            .ok_or(DeployError::InvalidRepositoryUrl)?;

        let owner = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let mut repo = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        while let Some(stripped) = repo.strip_suffix(GIT_SUFFIX) {
            repo = stripped;
        }

        if owner.is_empty() || repo.is_empty() {
            return Err(DeployError::InvalidRepositoryUrl);
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Parses repository URLs for one host, github.com or a GitHub Enterprise
/// server.
#[derive(Debug, Clone)]
pub struct RepositoryUrlParser {
    host: String,
    pattern: Regex,
}

impl RepositoryUrlParser {
    /// `host` is matched literally, e.g. `git.corp.example` or
    /// `git.corp.example:8443`.
    pub fn for_host(host: &str) -> Result<Self, regex::Error> {
        let host = host.trim().trim_end_matches('/').to_lowercase();
        if host.is_empty() || host == DEFAULT_REPOSITORY_HOST {
            return Ok(Self::default());
        }

        let pattern = Regex::new(&format!(
            "{}/{SEGMENT}/{SEGMENT}",
            regex::escape(&host)
        ))?;
        Ok(Self { host, pattern })
    }

    /// Host part of a base URL such as `https://git.corp.example/`.
    pub fn host_of(base_url: &str) -> &str {
        let trimmed = base_url.trim();
        let without_scheme = trimmed
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(trimmed);
        without_scheme.split('/').next().unwrap_or_default()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn parse(&self, url: &str) -> DeployResult<RepositoryReference> {
        RepositoryReference::from_match(&self.pattern, url)
    }
}

impl Default for RepositoryUrlParser {
    fn default() -> Self {
        Self {
            host: DEFAULT_REPOSITORY_HOST.to_string(),
            pattern: GITHUB_URL_PATTERN.clone(),
        }
    }
}

/// What the provider reports about a repository the caller can read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub full_name: Option<String>,
    pub private: Option<bool>,
    pub default_branch: Option<String>,
}
