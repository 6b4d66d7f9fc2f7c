//! Access to the chat model capability.
//!
//! The [`ChatModel`] trait is the consumed capability; [`ModelGateway`]
//! turns its outcomes into [`StageResult`](crate::core::StageResult)s.

mod model;
#[cfg(feature = "http-gateway")]
mod openai;
mod retry;

pub use model::{ChatModel, ModelGateway};
#[cfg(feature = "http-gateway")]
pub use openai::OpenAiCompatibleModel;
pub use retry::{with_retry, BackoffStrategy, JitterStrategy, RetryConfig};
