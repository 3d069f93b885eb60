use axum::{
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
    Json,
};
use pagesmith_core::DeployError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

pub struct AppError {
    pub status: StatusCode,
    pub error: ApiError,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError::new(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

fn status_for(err: &DeployError) -> StatusCode {
    match err {
        DeployError::Unauthorized => StatusCode::UNAUTHORIZED,
        DeployError::MalformedRequest
        | DeployError::MissingFields
        | DeployError::InvalidSubdomain
        | DeployError::InvalidRepositoryUrl => StatusCode::BAD_REQUEST,
        DeployError::SubdomainUnavailable => StatusCode::CONFLICT,
        DeployError::RepositoryNotFoundOrNoAccess => StatusCode::NOT_FOUND,
        DeployError::SubmissionFailed => StatusCode::SERVICE_UNAVAILABLE,
        DeployError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DeployError> for AppError {
    fn from(err: DeployError) -> Self {
        AppError::new(status_for(&err), err.to_string())
    }
}

pub type ApiResult<T> = Result<T, AppError>;
