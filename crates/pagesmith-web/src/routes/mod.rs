pub mod deploy;
pub mod health;

use axum::{
    routing::{
        get,
        post,
    },
    Router,
};

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/deploy", post(deploy::create_deployment))
}
