//! Pipeline stage names.

use super::Skill;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a stage's failure aborts the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    /// Failure aborts the invocation.
    Required,
    /// Failure is absorbed and the pipeline continues.
    Optional,
}

/// A position in the pipeline.
///
/// Several stages may share a skill: the frontend and merge stages are both
/// Implement invocations with different inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Plan the backend.
    Plan,
    /// Implement the plan.
    Implement,
    /// Plan the debugging pass.
    DebugPlan,
    /// Apply the debug plan.
    Debug,
    /// Generate the companion frontend.
    Frontend,
    /// Reconcile backend and frontend.
    Merge,
    /// Judge the final output.
    Validate,
    /// Write deployment instructions.
    Deploy,
}

impl StageName {
    /// Every stage, in pipeline order.
    pub const ALL: [Self; 8] = [
        Self::Plan,
        Self::Implement,
        Self::DebugPlan,
        Self::Debug,
        Self::Frontend,
        Self::Merge,
        Self::Validate,
        Self::Deploy,
    ];

    /// Returns the skill the stage invokes.
    #[must_use]
    pub const fn skill(self) -> Skill {
        match self {
            Self::Plan => Skill::Plan,
            Self::Implement | Self::Frontend | Self::Merge => Skill::Implement,
            Self::DebugPlan => Skill::DebugPlan,
            Self::Debug => Skill::Debug,
            Self::Validate => Skill::Validate,
            Self::Deploy => Skill::Deploy,
        }
    }

    /// Returns whether the stage's failure is fatal.
    #[must_use]
    pub const fn requirement(self) -> Requirement {
        match self {
            Self::Plan | Self::Implement => Requirement::Required,
            _ => Requirement::Optional,
        }
    }

    /// Returns true if the stage is required.
    #[must_use]
    pub const fn is_required(self) -> bool {
        matches!(self.requirement(), Requirement::Required)
    }

    /// Returns the wire name of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Implement => "implement",
            Self::DebugPlan => "debug_plan",
            Self::Debug => "debug",
            Self::Frontend => "frontend",
            Self::Merge => "merge",
            Self::Validate => "validate",
            Self::Deploy => "deploy",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_plan_and_implement_are_required() {
        let required: Vec<_> = StageName::ALL.into_iter().filter(|s| s.is_required()).collect();
        assert_eq!(required, vec![StageName::Plan, StageName::Implement]);
    }

    #[test]
    fn test_frontend_and_merge_use_implement() {
        assert_eq!(StageName::Frontend.skill(), Skill::Implement);
        assert_eq!(StageName::Merge.skill(), Skill::Implement);
        assert_eq!(StageName::Deploy.skill(), Skill::Deploy);
    }
}
