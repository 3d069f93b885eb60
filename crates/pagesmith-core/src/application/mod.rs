mod deployment_service;
mod job_submitter;

pub use deployment_service::{
    DeploymentService,
    PipelineStage,
    DEFAULT_RESOLVE_TIMEOUT,
};
pub use job_submitter::JobSubmitter;
