//! Route handlers.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use forgeflow::context::StageInput;
use forgeflow::core::{Skill, Slot, StageResult};
use forgeflow::pipeline::PipelineRequest;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateBody {
    prompt: String,
    #[serde(default)]
    fullstack: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StageBody {
    #[serde(default)]
    slots: HashMap<String, String>,
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub(crate) async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<Value>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt must not be empty"));
    }

    let request = PipelineRequest::new(body.prompt, body.fullstack);
    let result = state.service.generate(&request).await?;
    Ok(Json(json!({"success": true, "data": result})))
}

pub(crate) async fn run_stage(
    State(state): State<AppState>,
    Path(skill): Path<String>,
    Json(body): Json<StageBody>,
) -> Result<Json<Value>, ApiError> {
    let skill: Skill = skill.parse().map_err(|e| ApiError::bad_request(format!("{e}")))?;
    let input = body
        .slots
        .into_iter()
        .map(|(name, value)| {
            name.parse::<Slot>()
                .map(|slot| (slot, value))
                .map_err(|e| ApiError::bad_request(format!("{e}")))
        })
        .collect::<Result<StageInput, _>>()?;

    match state.service.orchestrator().runner().try_run(skill, &input).await? {
        StageResult::Success { text } => Ok(Json(json!({
            "success": true,
            "data": {"skill": skill, "text": text},
        }))),
        StageResult::Failure { reason } => Err(ApiError::new(StatusCode::BAD_GATEWAY, reason)),
    }
}

pub(crate) async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let store = Arc::clone(state.service.store());
    let lookup = name.clone();
    let content = tokio::task::spawn_blocking(move || store.read(&lookup))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))??;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{name}\"")),
        ],
        content,
    ))
}
