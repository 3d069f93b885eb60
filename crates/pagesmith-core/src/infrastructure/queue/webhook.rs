use std::time::Duration;

use async_trait::async_trait;
use chrono::{
    DateTime,
    Utc,
};
use secrecy::ExposeSecret;
use serde::Serialize;

use super::{
    JobQueue,
    QueueError,
    QueueResult,
};
use crate::domain::DeploymentJob;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobPayload<'a> {
    owner: &'a str,
    repo: &'a str,
    subdomain: &'a str,
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    requested_by: Option<&'a str>,
    requested_at: DateTime<Utc>,
}

impl<'a> From<&'a DeploymentJob> for JobPayload<'a> {
    fn from(job: &'a DeploymentJob) -> Self {
        Self {
            owner: job.owner(),
            repo: job.repo(),
            subdomain: job.subdomain.as_str(),
            access_token: job.access_token.expose_secret(),
            requested_by: job.requested_by.as_deref(),
            requested_at: job.requested_at,
        }
    }
}

/// Hands jobs to an HTTP endpoint (job API, serverless trigger) as JSON.
pub struct WebhookJobQueue {
    client: reqwest::Client,
    url: String,
}

impl WebhookJobQueue {
    pub fn new(url: impl Into<String>, timeout: Duration) -> QueueResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent("pagesmith")
            .build()
            .map_err(|e| QueueError::Unavailable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl JobQueue for WebhookJobQueue {
    async fn submit(&self, job: DeploymentJob) -> QueueResult<()> {
        let body = serde_json::to_vec(&JobPayload::from(&job))
            .map_err(|e| QueueError::Serialization(e.to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| QueueError::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                owner = %job.owner(),
                repo = %job.repo(),
                status = status.as_u16(),
                "Deployment job accepted by webhook"
            );
            return Ok(());
        }

        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(QueueError::Unavailable(format!("HTTP {status}")))
        } else {
            Err(QueueError::Rejected(format!("HTTP {status}")))
        }
    }

    fn backend_name(&self) -> &'static str {
        "webhook"
    }
}
