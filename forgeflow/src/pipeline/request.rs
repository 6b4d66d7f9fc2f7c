use crate::prompts::BACKEND_ONLY_DIRECTIVE;
use crate::stages::StageReport;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A request to generate code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequest {
    /// What the user asked for.
    pub original_prompt: String,
    /// Whether a companion frontend should be generated.
    #[serde(default)]
    pub fullstack_requested: bool,
}

impl PipelineRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(original_prompt: impl Into<String>, fullstack_requested: bool) -> Self {
        Self {
            original_prompt: original_prompt.into(),
            fullstack_requested,
        }
    }

    /// The prompt the backend track works from.
    ///
    /// When a frontend is requested separately the backend is told to leave
    /// the UI out.
    #[must_use]
    pub fn backend_prompt(&self) -> Cow<'_, str> {
        if self.fullstack_requested {
            Cow::Owned(format!("{BACKEND_ONLY_DIRECTIVE}{}", self.original_prompt))
        } else {
            Cow::Borrowed(&self.original_prompt)
        }
    }
}

/// Everything a successful pipeline run produced.
///
/// Optional fields are `None` when their stage did not run or failed; they
/// are never filled with placeholder text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    /// Identifier of the run, also attached to its log span.
    pub run_id: String,
    /// The final backend code.
    pub backend_code: String,
    /// The generated frontend.
    pub frontend_code: Option<String>,
    /// The corrected code produced by the debug stage.
    pub debug_output: Option<String>,
    /// The debug plan.
    pub debug_plan: Option<String>,
    /// The validation report.
    pub validation: Option<String>,
    /// Deployment instructions.
    pub deployment_instructions: Option<String>,
    /// The plan text.
    pub plan: String,
    /// The first implementation, before debugging or merging.
    pub implementation: String,
    /// What happened to each stage.
    pub stages: Vec<StageReport>,
}
