//! The outcome of a single stage.

use serde::{Deserialize, Serialize};

/// The outcome of one stage invocation.
///
/// Exactly one of text or reason is present; a failure never carries text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResult {
    /// The model produced usable text.
    Success {
        /// The extracted output.
        text: String,
    },
    /// The stage could not produce output.
    Failure {
        /// Why it failed.
        reason: String,
    },
}

impl StageResult {
    /// Creates a success.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success { text: text.into() }
    }

    /// Creates a failure.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns true for a success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true for a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Returns the text of a success.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success { text } => Some(text),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the reason of a failure.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }

    /// Converts into a `Result`, text on success and reason on failure.
    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Success { text } => Ok(text),
            Self::Failure { reason } => Err(reason),
        }
    }
}
