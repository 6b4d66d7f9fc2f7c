//! Event emission for pipeline and store observability.
//!
//! Sinks are passed explicitly to the components that emit; there is no
//! process-wide sink.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
