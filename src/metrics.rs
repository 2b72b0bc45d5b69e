//! Request metrics for model calls
//!
//! Every screen request records one outcome, labeled by operation.
//! Nothing is exported unless a recorder is installed, so the macros cost
//! next to nothing in normal runs.
//!
//! # Metrics
//!
//! - `mentor_requests_total`: Counter of requests by operation
//! - `mentor_request_duration_seconds`: Histogram of request latency
//! - `mentor_request_failures_total`: Counter of failures by operation and kind
//! - `mentor_parse_fallbacks_total`: Counter of replies that missed the expected shape
//! - `mentor_requests_active`: Gauge of outstanding requests
//!
//! # Examples
//!
//! ```
//! use arduino_mentor::metrics::RequestMetrics;
//!
//! let metrics = RequestMetrics::new("chat");
//! metrics.record_success();
//! ```

use metrics::{decrement_gauge, histogram, increment_counter, increment_gauge};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Metrics for one model request
///
/// Uses an atomic flag so the outcome can be recorded through a shared
/// reference from inside async code.
#[derive(Debug)]
pub struct RequestMetrics {
    operation: &'static str,
    start: Instant,
    recorded: AtomicBool,
}

impl RequestMetrics {
    pub fn new(operation: &'static str) -> Self {
        increment_counter!("mentor_requests_total", "operation" => operation);
        increment_gauge!("mentor_requests_active", 1.0, "operation" => operation);

        Self {
            operation,
            start: Instant::now(),
            recorded: AtomicBool::new(false),
        }
    }

    fn finish(&self) -> bool {
        // Only the first outcome counts.
        !self.recorded.swap(true, Ordering::SeqCst)
    }

    /// Records a completed request
    pub fn record_success(&self) {
        if !self.finish() {
            return;
        }
        histogram!(
            "mentor_request_duration_seconds",
            self.start.elapsed().as_secs_f64(),
            "operation" => self.operation,
            "outcome" => "ok"
        );
        decrement_gauge!("mentor_requests_active", 1.0, "operation" => self.operation);
    }

    /// Records a failed request
    ///
    /// `kind` is a short error class such as "transport" or "credentials".
    pub fn record_failure(&self, kind: &str) {
        if !self.finish() {
            return;
        }
        histogram!(
            "mentor_request_duration_seconds",
            self.start.elapsed().as_secs_f64(),
            "operation" => self.operation,
            "outcome" => "error"
        );
        increment_counter!(
            "mentor_request_failures_total",
            "operation" => self.operation,
            "kind" => kind.to_string()
        );
        decrement_gauge!("mentor_requests_active", 1.0, "operation" => self.operation);
    }

    /// Records a reply that had to fall back to raw text
    pub fn record_parse_fallback(&self) {
        increment_counter!("mentor_parse_fallbacks_total", "operation" => self.operation);
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for RequestMetrics {
    /// Keeps the active gauge accurate when a request is abandoned
    fn drop(&mut self) {
        if !self.recorded.load(Ordering::SeqCst) {
            decrement_gauge!("mentor_requests_active", 1.0, "operation" => self.operation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_recorded_once() {
        let metrics = RequestMetrics::new("chat");
        assert!(metrics.finish());
        assert!(!metrics.finish());
        metrics.record_failure("transport");
    }

    #[test]
    fn test_operation_label() {
        let metrics = RequestMetrics::new("vision");
        assert_eq!(metrics.operation(), "vision");
        metrics.record_parse_fallback();
        metrics.record_success();
    }

    #[test]
    fn test_drop_without_recording_does_not_panic() {
        let metrics = RequestMetrics::new("code");
        drop(metrics);
    }
}
