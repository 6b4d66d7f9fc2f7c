use crate::core::{ChatMessage, StageResult};
use crate::errors::GatewayError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A chat model that answers an ordered message list.
///
/// `Ok(None)` means the model answered without content. Implementations
/// may retry internally; whatever they return is final for the stage.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns a short identifier for logs.
    fn name(&self) -> &str;

    /// Sends the messages and returns the reply content.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, GatewayError>;
}

/// Shared handle to the chat model, cloned into every stage.
#[derive(Clone)]
pub struct ModelGateway {
    model: Arc<dyn ChatModel>,
}

impl ModelGateway {
    /// Wraps a chat model.
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Returns the model's name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Makes one logical call to the model.
    ///
    /// Errors and missing content become failures. Empty content is a
    /// success with empty text.
    pub async fn invoke(&self, messages: &[ChatMessage]) -> StageResult {
        match self.model.complete(messages).await {
            Ok(Some(text)) => StageResult::success(text),
            Ok(None) => {
                tracing::warn!(model = self.model.name(), "Model returned no content");
                StageResult::failure("model returned no content")
            }
            Err(e) => {
                tracing::warn!(model = self.model.name(), error = %e, "Model call failed");
                StageResult::failure(e.to_string())
            }
        }
    }
}

impl fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelGateway")
            .field("model", &self.model.name())
            .finish()
    }
}
