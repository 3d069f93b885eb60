use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{
    DeployError,
    DeployResult,
};

pub const MAX_LABEL_LENGTH: usize = 63;

static LABEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]{0,61}[a-z0-9]$").expect("Invalid regex pattern")
});

/// A subdomain that is safe to embed as a single DNS label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SubdomainLabel(String);

impl SubdomainLabel {
    pub fn parse(raw: &str) -> DeployResult<Self> {
        if LABEL_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(DeployError::InvalidSubdomain)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SubdomainLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubdomainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
