use std::net::SocketAddr;

use super::schema::{
    PagesmithConfig,
    QueueBackend,
    DEFAULT_BASE_DOMAIN,
};
use crate::domain::SubdomainLabel;

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<ConfigWarning>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>, code: ConfigErrorCode) {
        self.errors.push(ConfigError {
            field: field.to_string(),
            message: message.into(),
            code,
        });
    }

    pub fn add_warning(
        &mut self, field: &str, message: impl Into<String>, code: ConfigWarningCode,
    ) {
        self.warnings.push(ConfigWarning {
            field: field.to_string(),
            message: message.into(),
            code,
        });
    }

    pub fn summary(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() {
            "Configuration is valid".to_string()
        } else {
            format!(
                "{} error(s), {} warning(s)",
                self.errors.len(),
                self.warnings.len()
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub code: ConfigErrorCode,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    MissingRequired,
    InvalidValue,
}

impl std::fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired => write!(f, "MISSING_REQUIRED"),
            Self::InvalidValue => write!(f, "INVALID_VALUE"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub code: ConfigWarningCode,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarningCode {
    InsecureDefault,
    UnusedSetting,
}

impl std::fmt::Display for ConfigWarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsecureDefault => write!(f, "INSECURE_DEFAULT"),
            Self::UnusedSetting => write!(f, "UNUSED"),
        }
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &PagesmithConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_server(config, &mut result);
        Self::validate_deploy(config, &mut result);
        Self::validate_github(config, &mut result);
        Self::validate_queue(config, &mut result);

        if config.identity.trust_forwarded_headers {
            result.add_warning(
                "identity.trust_forwarded_headers",
                "Forwarded identity headers are trusted; make sure only the auth proxy can reach the server",
                ConfigWarningCode::InsecureDefault,
            );
        }

        result
    }

    fn validate_server(config: &PagesmithConfig, result: &mut ValidationResult) {
        if config.server.bind_addr.parse::<SocketAddr>().is_err() {
            result.add_error(
                "server.bind_addr",
                format!("'{}' is not a valid socket address", config.server.bind_addr),
                ConfigErrorCode::InvalidValue,
            );
        }

        if config.server.cors_allow_all {
            result.add_warning(
                "server.cors_allow_all",
                "CORS allows any origin",
                ConfigWarningCode::InsecureDefault,
            );
        }
    }

    fn validate_deploy(config: &PagesmithConfig, result: &mut ValidationResult) {
        let domain = config.deploy.base_domain.trim();

        if domain.is_empty() {
            result.add_error(
                "deploy.base_domain",
                "Base domain is required",
                ConfigErrorCode::MissingRequired,
            );
        } else if !is_valid_domain(domain) {
            result.add_error(
                "deploy.base_domain",
                format!("'{}' is not a valid domain name", domain),
                ConfigErrorCode::InvalidValue,
            );
        } else if domain == DEFAULT_BASE_DOMAIN {
            result.add_warning(
                "deploy.base_domain",
                "Using the placeholder base domain; deployment URLs will not resolve",
                ConfigWarningCode::InsecureDefault,
            );
        }
    }

    fn validate_github(config: &PagesmithConfig, result: &mut ValidationResult) {
        let base_url = config.github.base_url.trim();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            result.add_error(
                "github.base_url",
                format!("'{}' must be an http(s) URL", base_url),
                ConfigErrorCode::InvalidValue,
            );
        }

        if config.github.timeout_secs == 0 {
            result.add_error(
                "github.timeout_secs",
                "Timeout must be at least 1 second",
                ConfigErrorCode::InvalidValue,
            );
        }
    }

    fn validate_queue(config: &PagesmithConfig, result: &mut ValidationResult) {
        let queue = &config.queue;

        if queue.max_attempts == 0 {
            result.add_error(
                "queue.max_attempts",
                "At least one attempt is required",
                ConfigErrorCode::InvalidValue,
            );
        }

        match queue.backend {
            QueueBackend::Memory => {
                if queue.capacity == 0 {
                    result.add_error(
                        "queue.capacity",
                        "Capacity must be at least 1",
                        ConfigErrorCode::InvalidValue,
                    );
                }
                if queue.webhook_url.is_some() {
                    result.add_warning(
                        "queue.webhook_url",
                        "Ignored because the memory backend is selected",
                        ConfigWarningCode::UnusedSetting,
                    );
                }
            }
            QueueBackend::Webhook => match queue.webhook_url.as_deref().map(str::trim) {
                None | Some("") => result.add_error(
                    "queue.webhook_url",
                    "Webhook backend selected but webhook_url is empty",
                    ConfigErrorCode::MissingRequired,
                ),
                Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => {
                    result.add_error(
                        "queue.webhook_url",
                        format!("'{}' must be an http(s) URL", url),
                        ConfigErrorCode::InvalidValue,
                    )
                }
                Some(_) => {}
            },
        }

        if queue.request_timeout_secs == 0 {
            result.add_error(
                "queue.request_timeout_secs",
                "Timeout must be at least 1 second",
                ConfigErrorCode::InvalidValue,
            );
        }
    }
}

/// Every dot-separated part must itself be a valid subdomain label.
fn is_valid_domain(domain: &str) -> bool {
    domain.len() <= 253 && domain.split('.').all(|label| SubdomainLabel::parse(label).is_ok())
}
