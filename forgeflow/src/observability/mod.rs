//! Timing helpers for stage spans.

mod timer;

pub use timer::{duration_ms, SpanTimer};
