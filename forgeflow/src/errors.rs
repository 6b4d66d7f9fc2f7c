//! Error types for the forgeflow pipeline.
//!
//! The taxonomy separates contract violations (`ComposerFault`), model
//! capability problems (`GatewayError`), fatal pipeline outcomes
//! (`PipelineError`) and storage problems (`ArtifactError`), so callers can
//! tell "the model failed" apart from "the disk failed".

use crate::core::{Skill, Slot, StageName};
use crate::pipeline::PipelineResult;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// The umbrella error type for forgeflow operations.
#[derive(Debug, Error)]
pub enum ForgeflowError {
    /// A prompt could not be composed.
    #[error("{0}")]
    Composer(#[from] ComposerFault),

    /// The model capability failed.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// The pipeline failed fatally.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Artifact storage failed.
    #[error("{0}")]
    Artifact(#[from] ArtifactError),

    /// Configuration was invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Generation succeeded but persisting it did not.
    #[error("{0}")]
    Service(#[from] ServiceError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A required input slot was missing when composing a prompt.
///
/// This is a programming error in whoever built the `StageInput`, never an
/// expected runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("composer fault: skill '{skill}' requires slot '{slot}' which was not provided")]
pub struct ComposerFault {
    /// The skill being composed.
    pub skill: Skill,
    /// The missing slot.
    pub slot: Slot,
}

impl ComposerFault {
    /// Creates a missing-slot fault.
    #[must_use]
    pub fn missing_slot(skill: Skill, slot: Slot) -> Self {
        Self { skill, slot }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!("ComposerFault"));
        map.insert("skill".to_string(), serde_json::json!(self.skill.as_str()));
        map.insert("slot".to_string(), serde_json::json!(self.slot.as_str()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised by a chat model capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The capability cannot be used at all (e.g. missing credential).
    #[error("model capability unavailable: {reason}")]
    Unavailable {
        /// Why the capability is unavailable.
        reason: String,
    },

    /// The request never produced an HTTP response.
    #[error("transport error: {message}")]
    Transport {
        /// Underlying error message.
        message: String,
        /// Whether retrying may help.
        transient: bool,
    },

    /// The model API answered with a non-success status.
    #[error("model API returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The response could not be decoded.
    #[error("malformed model response: {message}")]
    Malformed {
        /// Decoding error message.
        message: String,
    },
}

impl GatewayError {
    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>, transient: bool) -> Self {
        Self::Transport {
            message: message.into(),
            transient,
        }
    }

    /// Creates a status error.
    #[must_use]
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same request may succeed.
    ///
    /// Rate limiting and server-side errors are transient; other client
    /// errors are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { transient, .. } => *transient,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unavailable { .. } | Self::Malformed { .. } => false,
        }
    }
}

/// A required stage returned a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("stage '{stage}' failed: {reason}")]
pub struct PipelineFailure {
    /// The failing stage.
    pub stage: StageName,
    /// The stage's failure reason.
    pub reason: String,
}

impl PipelineFailure {
    /// Creates a new pipeline failure.
    #[must_use]
    pub fn new(stage: StageName, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Fatal outcomes of a pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A required stage failed.
    #[error("{0}")]
    RequiredStage(#[from] PipelineFailure),

    /// A stage input was built incorrectly.
    #[error("{0}")]
    Composer(#[from] ComposerFault),

    /// The invocation was cancelled between stages.
    #[error("pipeline cancelled: {reason}")]
    Cancelled {
        /// The cancellation reason.
        reason: String,
    },

    /// The caller-level timeout expired.
    #[error("pipeline timed out after {timeout:?}")]
    TimedOut {
        /// The timeout that expired.
        timeout: Duration,
    },
}

impl PipelineError {
    /// Returns the failing stage, if the error came from one.
    #[must_use]
    pub fn stage(&self) -> Option<StageName> {
        match self {
            Self::RequiredStage(failure) => Some(failure.stage),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        let kind = match self {
            Self::RequiredStage(_) => "RequiredStageFailure",
            Self::Composer(_) => "ComposerFault",
            Self::Cancelled { .. } => "Cancelled",
            Self::TimedOut { .. } => "TimedOut",
        };
        map.insert("type".to_string(), serde_json::json!(kind));
        if let Some(stage) = self.stage() {
            map.insert("stage".to_string(), serde_json::json!(stage.as_str()));
        }
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised by the artifact store.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No live artifact has this name.
    #[error("artifact not found: {name}")]
    NotFound {
        /// The requested name.
        name: String,
    },

    /// The name is not usable as an artifact name.
    #[error("invalid artifact name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Writing or publishing the artifact failed.
    #[error("failed to write artifact '{name}': {source}")]
    Write {
        /// The artifact name.
        name: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Reading the artifact failed.
    #[error("failed to read artifact '{name}': {source}")]
    Read {
        /// The artifact name.
        name: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The artifact directory could not be prepared.
    #[error("artifact directory '{path}' unusable: {source}")]
    Directory {
        /// The directory path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl ArtifactError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an invalid-name error.
    #[must_use]
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for the not-found case.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was set to an unparseable value.
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        /// The variable name.
        key: String,
        /// The raw value.
        value: String,
        /// Parse error message.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(key: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the generate-and-persist facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The pipeline itself failed.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// The pipeline produced a result but it could not be stored.
    ///
    /// The result is carried along because the generated text is still valid.
    #[error("generated code could not be persisted: {source}")]
    Persist {
        /// The generated result.
        result: Box<PipelineResult>,
        /// The storage error.
        source: ArtifactError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composer_fault_message() {
        let fault = ComposerFault::missing_slot(Skill::Implement, Slot::Plan);
        assert_eq!(
            fault.to_string(),
            "composer fault: skill 'implement' requires slot 'plan' which was not provided"
        );

        let dict = fault.to_dict();
        assert_eq!(dict.get("type").unwrap(), "ComposerFault");
        assert_eq!(dict.get("slot").unwrap(), "plan");
    }

    #[test]
    fn test_gateway_error_transience() {
        assert!(GatewayError::status(429, "slow down").is_transient());
        assert!(GatewayError::status(503, "").is_transient());
        assert!(!GatewayError::status(401, "bad key").is_transient());
        assert!(GatewayError::transport("timed out", true).is_transient());
        assert!(!GatewayError::unavailable("no key").is_transient());
        assert!(!GatewayError::malformed("not json").is_transient());
    }

    #[test]
    fn test_pipeline_failure_display() {
        let err: PipelineError = PipelineFailure::new(StageName::Plan, "Error generating plan: boom").into();
        assert_eq!(err.stage(), Some(StageName::Plan));
        assert_eq!(err.to_string(), "stage 'plan' failed: Error generating plan: boom");

        let dict = err.to_dict();
        assert_eq!(dict.get("type").unwrap(), "RequiredStageFailure");
        assert_eq!(dict.get("stage").unwrap(), "plan");
    }

    #[test]
    fn test_timed_out_display() {
        let err = PipelineError::TimedOut {
            timeout: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "pipeline timed out after 30s");
        let short = PipelineError::TimedOut {
            timeout: Duration::from_millis(250),
        };
        assert_eq!(short.to_string(), "pipeline timed out after 250ms");
        assert!(err.stage().is_none());
    }

    #[test]
    fn test_artifact_error_not_found() {
        let err = ArtifactError::not_found("backend-source");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "artifact not found: backend-source");
        assert!(!ArtifactError::invalid_name("../x", "path separator").is_not_found());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("FORGEFLOW_MAX_TOKENS", "lots", "invalid digit found in string");
        assert!(err.to_string().contains("FORGEFLOW_MAX_TOKENS"));
        assert!(err.to_string().contains("lots"));
    }
}
