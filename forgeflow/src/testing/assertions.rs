//! Test assertions for stage and pipeline results.

use crate::core::{StageName, StageResult};
use crate::pipeline::PipelineResult;
use crate::stages::StageStatus;

/// Asserts that the stage succeeded and returns its text.
pub fn assert_stage_succeeded(result: &StageResult) -> &str {
    match result {
        StageResult::Success { text } => text,
        StageResult::Failure { reason } => panic!("Expected success, got failure: {reason}"),
    }
}

/// Asserts that the stage failed and returns its reason.
pub fn assert_stage_failed(result: &StageResult) -> &str {
    match result {
        StageResult::Failure { reason } => reason,
        StageResult::Success { text } => panic!("Expected failure, got success: {text:?}"),
    }
}

/// Asserts that the stage succeeded with exactly `expected`.
pub fn assert_stage_text(result: &StageResult, expected: &str) {
    assert_eq!(assert_stage_succeeded(result), expected, "Unexpected stage text");
}

/// Asserts the recorded status of one stage in a pipeline result.
pub fn assert_stage_status(result: &PipelineResult, stage: StageName, expected: StageStatus) {
    let report = result
        .stages
        .iter()
        .find(|r| r.stage == stage)
        .unwrap_or_else(|| panic!("No report for stage '{stage}' in {:?}", result.stages));
    assert_eq!(
        report.status, expected,
        "Expected stage '{stage}' to be {expected}, got {} ({:?})",
        report.status, report.error
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_assertions() {
        assert_stage_text(&StageResult::success("x"), "x");
        assert_eq!(assert_stage_failed(&StageResult::failure("boom")), "boom");
    }

    #[test]
    #[should_panic(expected = "Expected success")]
    fn test_assert_succeeded_panics_on_failure() {
        assert_stage_succeeded(&StageResult::failure("boom"));
    }
}
