//! Per-stage execution reports.

use crate::core::StageName;
use crate::observability::duration_ms;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a stage during one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// The stage produced output.
    Completed,
    /// The stage ran and failed.
    Failed,
    /// The stage did not run.
    Skipped,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Report for one stage of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReport {
    /// The stage.
    pub stage: StageName,
    /// What happened.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Failure reason, or why the stage was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageReport {
    /// Creates a completed report ending now.
    #[must_use]
    pub fn completed(stage: StageName, started_at: DateTime<Utc>) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
            started_at,
            ended_at: Utc::now(),
            error: None,
        }
    }

    /// Creates a failed report ending now.
    #[must_use]
    pub fn failed(stage: StageName, started_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Failed,
            started_at,
            ended_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Creates a zero-length skipped report.
    #[must_use]
    pub fn skipped(stage: StageName, why: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            stage,
            status: StageStatus::Skipped,
            started_at: now,
            ended_at: now,
            error: Some(why.into()),
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        duration_ms(self.started_at, self.ended_at)
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Completed
    }
}
