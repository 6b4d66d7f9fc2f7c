use super::extract;
use crate::context::StageInput;
use crate::core::{Skill, StageResult};
use crate::errors::ComposerFault;
use crate::events::{EventSink, NoOpEventSink};
use crate::gateway::ModelGateway;
use crate::observability::SpanTimer;
use crate::prompts::compose;
use futures::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs one skill: compose, invoke, extract.
///
/// [`run`](Self::run) never fails; every problem becomes a
/// [`StageResult::Failure`]. [`try_run`](Self::try_run) is the same except
/// that a [`ComposerFault`] is returned as an error, which is what the
/// orchestrator uses so that a miswired input fails loudly.
#[derive(Clone)]
pub struct StageRunner {
    gateway: ModelGateway,
    events: Arc<dyn EventSink>,
}

impl StageRunner {
    /// Creates a runner that emits no events.
    #[must_use]
    pub fn new(gateway: ModelGateway) -> Self {
        Self {
            gateway,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the gateway.
    #[must_use]
    pub fn gateway(&self) -> &ModelGateway {
        &self.gateway
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.events)
    }

    /// Runs a skill, converting every fault into a failure.
    pub async fn run(&self, skill: Skill, input: &StageInput) -> StageResult {
        match self.try_run(skill, input).await {
            Ok(result) => result,
            Err(fault) => StageResult::failure(fault.to_string()),
        }
    }

    /// Runs a skill, surfacing composer faults.
    pub async fn try_run(&self, skill: Skill, input: &StageInput) -> Result<StageResult, ComposerFault> {
        let messages = compose(skill, input).map_err(|fault| {
            error!(skill = %skill, slot = %fault.slot, "Stage input is missing a required slot");
            self.events.try_emit(
                "stage.failed",
                Some(json!({"skill": skill, "error": fault.to_string(), "composer_fault": true})),
            );
            fault
        })?;

        let timer = SpanTimer::start(skill.as_str());
        debug!(skill = %skill, slots = input.len(), model = self.gateway.model_name(), "Stage started");
        self.events.try_emit("stage.started", Some(json!({"skill": skill})));

        let outcome = AssertUnwindSafe(self.gateway.invoke(&messages))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| StageResult::failure("model client panicked"));

        let result = match outcome {
            StageResult::Success { text } => StageResult::success(extract(&text)),
            StageResult::Failure { reason } => {
                StageResult::failure(format!("Error {}: {reason}", skill.activity()))
            }
        };

        let duration_ms = timer.finish();
        match &result {
            StageResult::Success { text } => {
                info!(skill = %skill, duration_ms, chars = text.len(), "Stage completed");
                self.events.try_emit(
                    "stage.completed",
                    Some(json!({"skill": skill, "duration_ms": duration_ms})),
                );
            }
            StageResult::Failure { reason } => {
                warn!(skill = %skill, duration_ms, error = %reason, "Stage failed");
                self.events.try_emit(
                    "stage.failed",
                    Some(json!({"skill": skill, "duration_ms": duration_ms, "error": reason})),
                );
            }
        }

        Ok(result)
    }
}

impl std::fmt::Debug for StageRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRunner")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}
