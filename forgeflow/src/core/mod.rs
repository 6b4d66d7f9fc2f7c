//! Core domain model types for forgeflow.
//!
//! This module contains the vocabulary shared by every other module:
//! - Skills, input slots and stage names
//! - Chat messages exchanged with the model
//! - Stage results and artifacts

mod artifact;
mod message;
mod result;
mod skill;
mod stage;

pub use artifact::{validate_artifact_name, Artifact, BACKEND_SOURCE, FRONTEND_SOURCE, MAX_ARTIFACT_NAME_LEN};
pub use message::{ChatMessage, Role};
pub use result::StageResult;
pub use skill::{Skill, Slot, UnknownSkill, UnknownSlot};
pub use stage::{Requirement, StageName};
