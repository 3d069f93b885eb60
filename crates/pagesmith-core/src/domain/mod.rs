pub mod deployment;
pub mod error;
pub mod repository;
pub mod session;
pub mod subdomain;

pub use deployment::{
    DeploymentAccepted,
    DeploymentDetails,
    DeploymentInput,
    DeploymentJob,
    DeploymentRequest,
};
pub use error::{
    DeployError,
    DeployResult,
};
pub use repository::{
    RepositoryMetadata,
    RepositoryReference,
    RepositoryUrlParser,
};
pub use session::{
    Credentials,
    Session,
};
pub use subdomain::SubdomainLabel;
