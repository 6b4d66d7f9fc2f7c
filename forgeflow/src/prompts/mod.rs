//! Prompt composition.
//!
//! Every skill shares one composer: a fixed system instruction followed by
//! a human turn rendered from the skill's slots in a fixed order.

mod composer;
mod templates;

pub use composer::compose;
pub use templates::{
    system_instruction, BACKEND_ONLY_DIRECTIVE, FRONTEND_FILE_NAME, FRONTEND_INSTRUCTION,
    MERGE_INSTRUCTION,
};
