use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::AUTHORIZATION,
        HeaderMap,
    },
    Json,
};
use pagesmith_core::{
    Credentials,
    DeploymentAccepted,
    DeploymentDetails,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub const FORWARDED_USER_HEADER: &str = "x-forwarded-user";
pub const FORWARDED_ACCESS_TOKEN_HEADER: &str = "x-forwarded-access-token";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub success: bool,
    pub message: String,
    pub deployment_url: String,
    pub details: DeploymentDetails,
}

impl From<DeploymentAccepted> for DeployResponse {
    fn from(accepted: DeploymentAccepted) -> Self {
        Self {
            success: true,
            message: "Deployment started".to_string(),
            deployment_url: accepted.deployment_url,
            details: accepted.details,
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub(crate) fn credentials_from_headers(headers: &HeaderMap) -> Credentials {
    let bearer_token = header_value(headers, AUTHORIZATION.as_str()).and_then(|value| {
        let (scheme, token) = value.split_once(' ')?;
        scheme
            .eq_ignore_ascii_case("bearer")
            .then(|| token.trim().to_string())
    });

    Credentials {
        bearer_token: bearer_token.map(Into::into),
        forwarded_user: header_value(headers, FORWARDED_USER_HEADER),
        forwarded_access_token: header_value(headers, FORWARDED_ACCESS_TOKEN_HEADER)
            .map(Into::into),
    }
}

/// The body is taken raw so an undecodable payload is reported only after
/// the caller has been authenticated.
pub async fn create_deployment(
    State(state): State<AppState>, headers: HeaderMap, body: Bytes,
) -> ApiResult<Json<DeployResponse>> {
    let credentials = credentials_from_headers(&headers);

    let accepted = state
        .deployment_service
        .submit(&credentials, &body)
        .await?;

    Ok(Json(accepted.into()))
}
