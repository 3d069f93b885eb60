mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use pagesmith_core::infrastructure::{
    ConfigLoader,
    ConfigValidator,
};
use pagesmith_core::CoreContext;
use pagesmith_github::GitHubRepositoryAccess;
use tower_http::cors::{
    Any,
    CorsLayer,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

fn build_app(state: AppState, cors_allow_all: bool) -> Router {
    Router::new()
        .nest("/api", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(if cors_allow_all {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
        })
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    pagesmith_core::logging::init();

    tracing::info!("Starting Pagesmith deployment server");

    let config = ConfigLoader::load_default().context("Failed to load config")?;

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        tracing::warn!("Config: {}", warning);
    }
    if !validation.is_ok() {
        for error in &validation.errors {
            tracing::error!("Config: {}", error);
        }
        anyhow::bail!("Invalid configuration: {}", validation.summary());
    }

    let bind_addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind_addr))?;
    let cors_allow_all = config.server.cors_allow_all;

    let github = Arc::new(GitHubRepositoryAccess::new(&config.github));
    tracing::info!(api_url = %github.api_url(), "Using GitHub API");

    let core = CoreContext::from_config(config, github)
        .context("Failed to initialize deployment pipeline")?;

    let app = build_app(
        AppState::new(Arc::clone(&core.deployment_service)),
        cors_allow_all,
    );

    tracing::info!("Listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    core.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}
