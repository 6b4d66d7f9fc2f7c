//! HTTP front end for forgeflow.
//!
//! Routes:
//! - `GET /api/health`
//! - `POST /generate` runs the full pipeline and stores the output
//! - `POST /api/stages/:skill` runs a single stage
//! - `GET /downloads/:name` serves a stored artifact

pub mod error;
pub mod logging;
mod routes;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use forgeflow::config::ForgeflowConfig;
use forgeflow::events::{EventSink, LoggingEventSink};
use forgeflow::gateway::{ChatModel, ModelGateway, OpenAiCompatibleModel};
use forgeflow::pipeline::{CodegenService, Orchestrator};
use forgeflow::stages::StageRunner;
use forgeflow::store::ArtifactStore;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    service: CodegenService,
}

impl AppState {
    /// Wraps a service.
    pub const fn new(service: CodegenService) -> Self {
        Self { service }
    }

    /// Returns the service.
    pub const fn service(&self) -> &CodegenService {
        &self.service
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/generate", post(routes::generate))
        .route("/api/stages/:skill", post(routes::run_stage))
        .route("/downloads/:name", get(routes::download))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Builds a service from configuration around the given model.
pub fn build_service_with_model(
    config: &ForgeflowConfig,
    model: Arc<dyn ChatModel>,
) -> anyhow::Result<CodegenService> {
    let events: Arc<dyn EventSink> = Arc::new(LoggingEventSink::debug());

    let runner = StageRunner::new(ModelGateway::new(model)).with_event_sink(Arc::clone(&events));
    let orchestrator = Orchestrator::new(runner, config.pipeline);

    let store = ArtifactStore::open(&config.artifacts.dir, config.artifacts.retention())
        .with_context(|| format!("opening artifact directory {}", config.artifacts.dir.display()))?
        .with_event_sink(events);

    let service = CodegenService::new(Arc::new(orchestrator), Arc::new(store));
    Ok(match config.pipeline_timeout() {
        Some(timeout) => service.with_timeout(timeout),
        None => service,
    })
}

/// Builds a service from configuration using the HTTP chat model.
pub fn build_service(config: &ForgeflowConfig) -> anyhow::Result<CodegenService> {
    let model = OpenAiCompatibleModel::new(config.gateway.clone()).context("building model client")?;
    build_service_with_model(config, Arc::new(model))
}
