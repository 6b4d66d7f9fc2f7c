//! Inputs handed to a single stage.

mod inputs;

pub use inputs::StageInput;
