//! Span helpers for model loads.

use tracing::{info_span, Span};

/// Extension trait for recording outcomes into spans.
pub trait SpanExt {
    /// Record `status` and, on failure, `error.message`.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for model load spans.
pub struct LoadSpan;

impl LoadSpan {
    /// Span for one `load` call.
    ///
    /// `status`, `error.message`, `from_cache`, `bytes` and `latency_ms` are
    /// filled in as the load progresses.
    pub fn new(model_name: &str, validation_only: bool) -> Span {
        info_span!(
            "model_load",
            model = %model_name,
            validation_only,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            from_cache = tracing::field::Empty,
            bytes = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    }
}
