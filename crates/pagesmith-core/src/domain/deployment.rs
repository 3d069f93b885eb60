use std::fmt;

use chrono::{
    DateTime,
    Utc,
};
use secrecy::SecretString;
use serde::de::value::MapAccessDeserializer;
use serde::de::{
    MapAccess,
    Visitor,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

use super::{
    DeployError,
    DeployResult,
    RepositoryReference,
    SubdomainLabel,
};

/// Body of a deployment submission as sent by the caller.
///
/// Both fields are optional at the decoding level so that an absent field is
/// reported as [`DeployError::MissingFields`] instead of a decode failure.
/// Only a JSON object decodes; a positional array is rejected.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRequest {
    pub repo_url: Option<String>,
    pub subdomain: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestFields {
    #[serde(default)]
    repo_url: Option<String>,
    #[serde(default)]
    subdomain: Option<String>,
}

struct RequestVisitor;

impl<'de> Visitor<'de> for RequestVisitor {
    type Value = RequestFields;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        RequestFields::deserialize(MapAccessDeserializer::new(map))
    }
}

impl<'de> Deserialize<'de> for DeploymentRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = deserializer.deserialize_map(RequestVisitor)?;
        Ok(Self {
            repo_url: fields.repo_url,
            subdomain: fields.subdomain,
        })
    }
}

/// A request whose fields are both present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentInput {
    pub repo_url: String,
    pub subdomain: String,
}

impl DeploymentRequest {
    pub fn new(repo_url: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            repo_url: Some(repo_url.into()),
            subdomain: Some(subdomain.into()),
        }
    }

    pub fn from_json(body: &[u8]) -> DeployResult<Self> {
        serde_json::from_slice(body).map_err(|_| DeployError::MalformedRequest)
    }

    pub fn require_fields(self) -> DeployResult<DeploymentInput> {
        match (self.repo_url, self.subdomain) {
            (Some(repo_url), Some(subdomain)) if !repo_url.is_empty() && !subdomain.is_empty() => {
                Ok(DeploymentInput {
                    repo_url,
                    subdomain,
                })
            }
            _ => Err(DeployError::MissingFields),
        }
    }
}

/// The unit of work handed to the job queue.
#[derive(Clone)]
pub struct DeploymentJob {
    pub repository: RepositoryReference,
    pub subdomain: SubdomainLabel,
    pub access_token: SecretString,
    pub requested_by: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl DeploymentJob {
    pub fn new(
        repository: RepositoryReference, subdomain: SubdomainLabel, access_token: SecretString,
        requested_by: Option<String>,
    ) -> Self {
        Self {
            repository,
            subdomain,
            access_token,
            requested_by,
            requested_at: Utc::now(),
        }
    }

    pub fn owner(&self) -> &str {
        self.repository.owner()
    }

    pub fn repo(&self) -> &str {
        self.repository.repo()
    }
}

impl fmt::Debug for DeploymentJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentJob")
            .field("owner", &self.owner())
            .field("repo", &self.repo())
            .field("subdomain", &self.subdomain.as_str())
            .field("access_token", &"[REDACTED]")
            .field("requested_by", &self.requested_by)
            .field("requested_at", &self.requested_at)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentDetails {
    pub owner: String,
    pub repo: String,
    pub subdomain: String,
}

/// Successful outcome of a deployment submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentAccepted {
    pub deployment_url: String,
    pub details: DeploymentDetails,
}
