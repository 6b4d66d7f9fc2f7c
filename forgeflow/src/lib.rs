//! # Forgeflow
//!
//! An orchestrator for LLM-driven code generation.
//!
//! A single prompt is carried through a fixed sequence of model-backed
//! stages:
//!
//! - **Backend track**: plan, implement, debug plan and debug
//! - **Frontend track**: a companion `index.html` and a merge pass, on request
//! - **Validation and deployment notes** on the finished code
//!
//! Only planning and implementation are required. Every other stage
//! degrades to an absent field instead of failing the run. Generated code
//! is kept in an [`store::ArtifactStore`] for a limited time.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forgeflow::prelude::*;
//! use std::sync::Arc;
//!
//! let model = OpenAiCompatibleModel::new(GatewayConfig::default().with_api_key(key))?;
//! let runner = StageRunner::new(ModelGateway::new(Arc::new(model)));
//! let orchestrator = Orchestrator::new(runner, PipelineOptions::default());
//!
//! let result = orchestrator.run_pipeline("build a counter button", true).await?;
//! println!("{}", result.backend_code);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod observability;
pub mod pipeline;
pub mod prompts;
pub mod stages;
pub mod store;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{ArtifactConfig, ForgeflowConfig, GatewayConfig, ServerConfig};
    pub use crate::context::StageInput;
    pub use crate::core::{Artifact, ChatMessage, Role, Skill, Slot, StageName, StageResult};
    pub use crate::errors::{
        ArtifactError, ComposerFault, ConfigError, ForgeflowError, GatewayError, PipelineError,
        PipelineFailure, ServiceError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    #[cfg(feature = "http-gateway")]
    pub use crate::gateway::OpenAiCompatibleModel;
    pub use crate::gateway::{ChatModel, ModelGateway};
    pub use crate::pipeline::{
        CodegenService, Orchestrator, PipelineOptions, PipelineRequest, PipelineResult,
    };
    pub use crate::prompts::compose;
    pub use crate::stages::{extract, StageReport, StageRunner, StageStatus};
    pub use crate::store::{ArtifactStore, RetentionSweeper, SweeperHandle};
}
