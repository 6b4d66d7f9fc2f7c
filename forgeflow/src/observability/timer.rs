use chrono::{DateTime, Utc};
use std::time::Instant;

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    started_at: DateTime<Utc>,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            started_at: Utc::now(),
            name: name.into(),
        }
    }

    /// Returns the wall-clock start time.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

/// Milliseconds between two timestamps, never negative.
#[must_use]
pub fn duration_ms(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> f64 {
    let micros = ended_at
        .signed_duration_since(started_at)
        .num_microseconds()
        .unwrap_or(i64::MAX)
        .max(0);
    #[allow(clippy::cast_precision_loss)]
    let ms = micros as f64 / 1000.0;
    ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("plan");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(timer.name(), "plan");
        assert!(timer.started_at() <= Utc::now());
        assert!(timer.finish() >= 5.0);
    }

    #[test]
    fn test_duration_ms() {
        let start = Utc::now();
        let end = start + chrono::Duration::milliseconds(1500);
        assert!((duration_ms(start, end) - 1500.0).abs() < f64::EPSILON);
        assert!(duration_ms(end, start).abs() < f64::EPSILON);
    }
}
