//! Telemetry for the model loader.
//!
//! Structured logging, load spans and metrics facade helpers.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use self::metrics::{
    record_cache_hit, record_cache_miss, record_load_failure, record_load_success,
    record_prediction, record_validation,
};
pub use spans::{LoadSpan, SpanExt};
