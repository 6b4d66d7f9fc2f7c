//! Running single stages.
//!
//! A stage is one composed prompt, one model call and one extraction. The
//! [`StageRunner`] is the only place those three steps are glued together.

mod extract;
mod report;
mod runner;

pub use extract::extract;
pub use report::{StageReport, StageStatus};
pub use runner::StageRunner;
