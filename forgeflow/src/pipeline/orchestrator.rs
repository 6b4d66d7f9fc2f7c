use super::ledger::StageLedger;
use super::options::PipelineOptions;
use super::request::{PipelineRequest, PipelineResult};
use crate::cancellation::CancellationToken;
use crate::context::StageInput;
use crate::core::{Requirement, Slot, StageName, StageResult};
use crate::errors::{PipelineError, PipelineFailure};
use crate::events::EventSink;
use crate::observability::SpanTimer;
use crate::prompts::{FRONTEND_INSTRUCTION, MERGE_INSTRUCTION};
use crate::stages::{StageReport, StageRunner};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Sequences stages into a full code-generation run.
///
/// The backend track (plan, implement, debug plan, debug) always runs. When
/// a frontend is requested, the frontend track (frontend, merge) runs on the
/// finalized backend code alongside the deploy stage; validation runs last,
/// on the final code. Only plan and implement are required; every other
/// stage degrades to an absent field.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    runner: StageRunner,
    options: PipelineOptions,
}

/// Per-run state shared by both tracks.
struct Run<'a> {
    token: &'a CancellationToken,
    ledger: StageLedger,
}

impl Orchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(runner: StageRunner, options: PipelineOptions) -> Self {
        Self { runner, options }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Returns the stage runner.
    #[must_use]
    pub fn runner(&self) -> &StageRunner {
        &self.runner
    }

    /// Runs the pipeline for a prompt.
    pub async fn run_pipeline(
        &self,
        original_prompt: impl Into<String>,
        fullstack_requested: bool,
    ) -> Result<PipelineResult, PipelineError> {
        self.run(&PipelineRequest::new(original_prompt, fullstack_requested))
            .await
    }

    /// Runs the pipeline for a request.
    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineResult, PipelineError> {
        self.run_cancellable(request, &CancellationToken::new()).await
    }

    /// Runs the pipeline, abandoning it once `timeout` has elapsed.
    pub async fn run_with_timeout(
        &self,
        request: &PipelineRequest,
        timeout: Duration,
    ) -> Result<PipelineResult, PipelineError> {
        let token = CancellationToken::new();
        match tokio::time::timeout(timeout, self.run_cancellable(request, &token)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                token.cancel("timed out");
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "Pipeline timed out");
                self.events().try_emit(
                    "pipeline.failed",
                    Some(json!({"error": "timed out", "timeout_ms": timeout_ms})),
                );
                Err(PipelineError::TimedOut { timeout })
            }
        }
    }

    /// Runs the pipeline, checking `token` before every stage.
    pub async fn run_cancellable(
        &self,
        request: &PipelineRequest,
        token: &CancellationToken,
    ) -> Result<PipelineResult, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("pipeline", run_id = %run_id, fullstack = request.fullstack_requested);

        async {
            let timer = SpanTimer::start("pipeline");
            let outcome = self.execute(request, token, run_id.clone()).await;
            let duration_ms = timer.finish();

            match &outcome {
                Ok(result) => {
                    info!(duration_ms, stages = result.stages.len(), "Pipeline completed");
                    self.events().try_emit(
                        "pipeline.completed",
                        Some(json!({"run_id": run_id, "duration_ms": duration_ms})),
                    );
                }
                Err(e) => {
                    error!(duration_ms, error = %e, "Pipeline failed");
                    self.events().try_emit(
                        "pipeline.failed",
                        Some(json!({"run_id": run_id, "duration_ms": duration_ms, "error": e.to_string()})),
                    );
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: &PipelineRequest,
        token: &CancellationToken,
        run_id: String,
    ) -> Result<PipelineResult, PipelineError> {
        let run = Run {
            token,
            ledger: StageLedger::new(),
        };
        let backend_prompt = request.backend_prompt();
        let original_prompt = request.original_prompt.as_str();

        // Backend track.
        let plan = self
            .required(
                &run,
                StageName::Plan,
                StageInput::new().with(Slot::OriginalPrompt, &*backend_prompt),
            )
            .await?;

        let implementation = self
            .required(
                &run,
                StageName::Implement,
                StageInput::new()
                    .with(Slot::OriginalPrompt, &*backend_prompt)
                    .with(Slot::Plan, plan.as_str()),
            )
            .await?;

        let debug_plan = self
            .optional(
                &run,
                StageName::DebugPlan,
                StageInput::new()
                    .with(Slot::OriginalPrompt, &*backend_prompt)
                    .with(Slot::Code, implementation.as_str()),
            )
            .await?;

        let debug_output = match &debug_plan {
            Some(debug_plan) => {
                self.optional(
                    &run,
                    StageName::Debug,
                    StageInput::new()
                        .with(Slot::OriginalPrompt, &*backend_prompt)
                        .with(Slot::Code, implementation.as_str())
                        .with(Slot::DebugPlan, debug_plan.as_str()),
                )
                .await?
            }
            None => {
                run.ledger.skip(StageName::Debug, "no debug plan");
                None
            }
        };

        let backend_code = debug_output.clone().unwrap_or_else(|| implementation.clone());

        // Frontend track and deployment notes both work from the finalized backend.
        let frontend_track = self.frontend_track(&run, request, &backend_code);
        let deploy = async {
            if !self.options.deployment_instructions {
                run.ledger.skip(StageName::Deploy, "disabled");
                return Ok(None);
            }
            self.optional(
                &run,
                StageName::Deploy,
                StageInput::new()
                    .with(Slot::OriginalPrompt, original_prompt)
                    .with(Slot::Code, backend_code.as_str()),
            )
            .await
        };
        let (frontend, deployment_instructions) = tokio::join!(frontend_track, deploy);
        let (frontend_code, merged) = frontend?;
        let deployment_instructions = deployment_instructions?;

        let backend_code = merged.unwrap_or(backend_code);

        let validation = if self.options.validate {
            self.optional(
                &run,
                StageName::Validate,
                StageInput::new()
                    .with(Slot::OriginalPrompt, original_prompt)
                    .with(Slot::Code, backend_code.as_str()),
            )
            .await?
        } else {
            run.ledger.skip(StageName::Validate, "disabled");
            None
        };

        Ok(PipelineResult {
            run_id,
            backend_code,
            frontend_code,
            debug_output,
            debug_plan,
            validation,
            deployment_instructions,
            plan,
            implementation,
            stages: run.ledger.into_reports(),
        })
    }

    /// Returns the frontend code and, if merging succeeded, the merged backend.
    async fn frontend_track(
        &self,
        run: &Run<'_>,
        request: &PipelineRequest,
        backend_code: &str,
    ) -> Result<(Option<String>, Option<String>), PipelineError> {
        if !request.fullstack_requested {
            return Ok((None, None));
        }

        let frontend = self
            .optional(
                run,
                StageName::Frontend,
                StageInput::new()
                    .with(Slot::OriginalPrompt, request.original_prompt.as_str())
                    .with(Slot::Plan, FRONTEND_INSTRUCTION)
                    .with(Slot::PriorCode, backend_code),
            )
            .await?;

        let merged = match (&frontend, self.options.merge) {
            (Some(frontend), true) => {
                self.optional(
                    run,
                    StageName::Merge,
                    StageInput::new()
                        .with(Slot::OriginalPrompt, request.original_prompt.as_str())
                        .with(Slot::Plan, MERGE_INSTRUCTION)
                        .with(Slot::PriorCode, backend_code)
                        .with(Slot::CompanionCode, frontend.as_str()),
                )
                .await?
            }
            (Some(_), false) => {
                run.ledger.skip(StageName::Merge, "disabled");
                None
            }
            (None, _) => {
                run.ledger.skip(StageName::Merge, "no frontend code");
                None
            }
        };

        Ok((frontend, merged))
    }

    async fn required(&self, run: &Run<'_>, stage: StageName, input: StageInput) -> Result<String, PipelineError> {
        debug_assert_eq!(stage.requirement(), Requirement::Required);
        match self.stage(run, stage, input).await? {
            StageResult::Success { text } => Ok(text),
            StageResult::Failure { reason } => Err(PipelineFailure::new(stage, reason).into()),
        }
    }

    async fn optional(&self, run: &Run<'_>, stage: StageName, input: StageInput) -> Result<Option<String>, PipelineError> {
        debug_assert_eq!(stage.requirement(), Requirement::Optional);
        match self.stage(run, stage, input).await? {
            StageResult::Success { text } => Ok(Some(text)),
            StageResult::Failure { reason } => {
                warn!(stage = %stage, error = %reason, "Optional stage failed, continuing");
                Ok(None)
            }
        }
    }

    async fn stage(&self, run: &Run<'_>, stage: StageName, input: StageInput) -> Result<StageResult, PipelineError> {
        if run.token.is_cancelled() {
            return Err(PipelineError::Cancelled {
                reason: run.token.reason().unwrap_or_default(),
            });
        }

        let started_at = Utc::now();
        let result = self.runner.try_run(stage.skill(), &input).await?;
        run.ledger.record(match &result {
            StageResult::Success { .. } => StageReport::completed(stage, started_at),
            StageResult::Failure { reason } => StageReport::failed(stage, started_at, reason.clone()),
        });
        Ok(result)
    }

    fn events(&self) -> Arc<dyn EventSink> {
        self.runner.event_sink()
    }
}
