//! Named, timestamped outputs held by the artifact store.

use crate::errors::ArtifactError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Name under which the finalized backend code is stored.
pub const BACKEND_SOURCE: &str = "backend-source";

/// Name under which the generated frontend is stored.
pub const FRONTEND_SOURCE: &str = "frontend-source";

/// Longest accepted artifact name, in bytes.
pub const MAX_ARTIFACT_NAME_LEN: usize = 128;

/// A stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// The artifact name.
    pub name: String,
    /// The stored text.
    pub content: String,
    /// When the current content was published.
    pub written_at: DateTime<Utc>,
}

impl Artifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>, written_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            written_at,
        }
    }

    /// Returns how long ago the artifact was written.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.written_at)
    }

    /// Returns true once the artifact is strictly older than the window.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        self.age(now) > retention
    }
}

/// Checks that a name is safe to use as a file name in the store.
///
/// Names are limited to ASCII letters, digits, `.`, `_` and `-`, must not
/// start with a dot and must be at most [`MAX_ARTIFACT_NAME_LEN`] bytes.
pub fn validate_artifact_name(name: &str) -> Result<(), ArtifactError> {
    if name.is_empty() {
        return Err(ArtifactError::invalid_name(name, "name is empty"));
    }
    if name.len() > MAX_ARTIFACT_NAME_LEN {
        return Err(ArtifactError::invalid_name(
            name,
            format!("name longer than {MAX_ARTIFACT_NAME_LEN} bytes"),
        ));
    }
    if name.starts_with('.') {
        return Err(ArtifactError::invalid_name(name, "name starts with a dot"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(ArtifactError::invalid_name(
            name,
            format!("character {bad:?} is not allowed"),
        ));
    }
    Ok(())
}
