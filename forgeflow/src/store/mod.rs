//! Durable, time-limited storage for generated code.
//!
//! Artifacts are files in one directory. Writes are published atomically,
//! operations on one name are serialized, and anything older than the
//! retention window is treated as gone and eventually deleted.

mod artifact_store;
mod clock;
mod retention;

pub use artifact_store::ArtifactStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use retention::{RetentionSweeper, SweeperHandle};
