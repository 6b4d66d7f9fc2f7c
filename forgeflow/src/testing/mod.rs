//! Testing utilities for forgeflow pipelines.
//!
//! This module provides:
//! - Scripted and failing chat models
//! - Assertions for stage and pipeline results

mod assertions;
mod mocks;

pub use assertions::{
    assert_stage_failed, assert_stage_status, assert_stage_succeeded, assert_stage_text,
};
pub use mocks::{FailingChatModel, RecordedCall, Reply, ScriptedChatModel};
