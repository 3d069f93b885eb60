use thiserror::Error;

/// Failure outcomes of the deployment intake pipeline.
///
/// The `Display` text of each variant is the message returned to the caller.
/// Causes from collaborators are logged where they occur and never carried
/// into these messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid request body")]
    MalformedRequest,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid subdomain format")]
    InvalidSubdomain,

    #[error("Invalid GitHub URL format")]
    InvalidRepositoryUrl,

    #[error("Subdomain is already taken")]
    SubdomainUnavailable,

    #[error("Repository not found or no access")]
    RepositoryNotFoundOrNoAccess,

    #[error("Failed to queue deployment")]
    SubmissionFailed,

    /// The inner string is for logs only.
    #[error("Failed to start deployment")]
    Internal(String),
}

impl DeployError {
    pub fn code(&self) -> &'static str {
        match self {
            DeployError::Unauthorized => "UNAUTHORIZED",
            DeployError::MalformedRequest => "MALFORMED_REQUEST",
            DeployError::MissingFields => "MISSING_FIELDS",
            DeployError::InvalidSubdomain => "INVALID_SUBDOMAIN",
            DeployError::InvalidRepositoryUrl => "INVALID_REPOSITORY_URL",
            DeployError::SubdomainUnavailable => "SUBDOMAIN_UNAVAILABLE",
            DeployError::RepositoryNotFoundOrNoAccess => "REPOSITORY_NOT_FOUND",
            DeployError::SubmissionFailed => "SUBMISSION_FAILED",
            DeployError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure was caused by the caller's input rather than by a
    /// collaborator or the service itself.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DeployError::MalformedRequest
                | DeployError::MissingFields
                | DeployError::InvalidSubdomain
                | DeployError::InvalidRepositoryUrl
        )
    }
}

pub type DeployResult<T> = Result<T, DeployError>;
