//! Pipeline orchestration.
//!
//! This module provides:
//! - Request, options and result types
//! - The orchestrator that sequences the backend and frontend tracks
//! - The service facade that runs a pipeline and persists its output

mod ledger;
mod options;
mod orchestrator;
mod request;
mod service;


pub use ledger::StageLedger;
pub use options::PipelineOptions;
pub use orchestrator::Orchestrator;
pub use request::{PipelineRequest, PipelineResult};
pub use service::CodegenService;
