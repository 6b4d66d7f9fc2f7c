use anyhow::Context;
use forgeflow::config::ForgeflowConfig;
use forgeflow::store::RetentionSweeper;
use forgeflow_server::{build_service, logging, router, AppState};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = ForgeflowConfig::from_env().context("loading configuration")?;
    if config.gateway.api_key.is_none() {
        warn!("GROQ_API_KEY is not set; every stage will fail until it is");
    }

    let service = build_service(&config)?;
    let sweeper = RetentionSweeper::new(Arc::clone(service.store()), config.artifacts.sweep_interval()).start();

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(
        bind = %config.server.bind,
        model = %config.gateway.model,
        artifacts = %config.artifacts.dir.display(),
        "forgeflow-server listening"
    );

    let served = axum::serve(listener, router(AppState::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with error");

    sweeper.stop().await;
    info!("forgeflow-server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
