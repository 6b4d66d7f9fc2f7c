use serde::{Deserialize, Serialize};

/// Switches for the optional stages of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Run the merge stage after a successful frontend stage.
    #[serde(default = "default_true")]
    pub merge: bool,
    /// Run the validate stage.
    #[serde(default = "default_true")]
    pub validate: bool,
    /// Run the deploy stage.
    #[serde(default)]
    pub deployment_instructions: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            merge: true,
            validate: true,
            deployment_instructions: false,
        }
    }
}

impl PipelineOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the merge stage.
    #[must_use]
    pub fn with_merge(mut self, enabled: bool) -> Self {
        self.merge = enabled;
        self
    }

    /// Enables or disables the validate stage.
    #[must_use]
    pub fn with_validate(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Enables or disables the deploy stage.
    #[must_use]
    pub fn with_deployment_instructions(mut self, enabled: bool) -> Self {
        self.deployment_instructions = enabled;
        self
    }
}
