use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};

pub(super) const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

pub(super) const DEFAULT_CORS_ALLOW_ALL: bool = false;

pub const DEFAULT_BASE_DOMAIN: &str = "example.com";

pub(super) const DEFAULT_GITHUB_BASE_URL: &str = "https://github.com";

pub(super) const DEFAULT_GITHUB_TIMEOUT_SECS: u64 = 10;

pub(super) const DEFAULT_QUEUE_CAPACITY: usize = 256;

pub(super) const DEFAULT_QUEUE_MAX_ATTEMPTS: usize = 3;

pub(super) const DEFAULT_QUEUE_RETRY_DELAY_MS: u64 = 200;

pub(super) const DEFAULT_QUEUE_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    #[default]
    Memory,
    Webhook,
}

impl std::fmt::Display for QueueBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Webhook => write!(f, "webhook"),
        }
    }
}

impl std::str::FromStr for QueueBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "channel" => Ok(Self::Memory),
            "webhook" | "http" => Ok(Self::Webhook),
            _ => Err(format!(
                "Unknown queue backend: {}. Valid options: memory, webhook",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PagesmithConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub deploy: DeployConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_cors_allow_all")]
    pub cors_allow_all: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_allow_all: default_cors_allow_all(),
        }
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_cors_allow_all() -> bool {
    DEFAULT_CORS_ALLOW_ALL
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Deployed sites are served at `https://{subdomain}.{base_domain}`.
    #[serde(default = "default_base_domain")]
    pub base_domain: String,

    #[serde(default)]
    pub reserved_subdomains: Vec<String>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            reserved_subdomains: Vec::new(),
        }
    }
}

fn default_base_domain() -> String {
    DEFAULT_BASE_DOMAIN.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// `https://github.com` or a GitHub Enterprise host.
    #[serde(default = "default_github_base_url")]
    pub base_url: String,

    #[serde(default = "default_github_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: default_github_base_url(),
            timeout_secs: default_github_timeout_secs(),
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_github_base_url() -> String {
    DEFAULT_GITHUB_BASE_URL.to_string()
}

fn default_github_timeout_secs() -> u64 {
    DEFAULT_GITHUB_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub backend: QueueBackend,

    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    #[serde(default = "default_queue_max_attempts")]
    pub max_attempts: usize,

    #[serde(default = "default_queue_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_queue_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            capacity: default_queue_capacity(),
            webhook_url: None,
            max_attempts: default_queue_max_attempts(),
            retry_delay_ms: default_queue_retry_delay_ms(),
            request_timeout_secs: default_queue_request_timeout_secs(),
        }
    }
}

impl QueueConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

fn default_queue_max_attempts() -> usize {
    DEFAULT_QUEUE_MAX_ATTEMPTS
}

fn default_queue_retry_delay_ms() -> u64 {
    DEFAULT_QUEUE_RETRY_DELAY_MS
}

fn default_queue_request_timeout_secs() -> u64 {
    DEFAULT_QUEUE_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdentityConfig {
    /// Accept `X-Forwarded-User` / `X-Forwarded-Access-Token` from an
    /// authenticating proxy. Only safe when nothing else can reach the server.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}
