use std::sync::Arc;

use pagesmith_core::DeploymentService;

#[derive(Clone)]
pub struct AppState {
    pub deployment_service: Arc<DeploymentService>,
    pub queue_backend: &'static str,
    pub base_domain: String,
}

impl AppState {
    pub fn new(deployment_service: Arc<DeploymentService>) -> Self {
        let queue_backend = deployment_service.submitter().backend_name();
        let base_domain = deployment_service.submitter().base_domain().to_string();
        Self {
            deployment_service,
            queue_backend,
            base_domain,
        }
    }
}
