//! Metrics facade helpers.
//!
//! Recorded through the `metrics` crate; exporting is up to the host.

use std::time::Duration;

use ::metrics::{counter, histogram};

pub fn record_cache_hit() {
    counter!("model_loader_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("model_loader_cache_misses_total").increment(1);
}

/// A full load that downloaded and deserialized `bytes`.
pub fn record_load_success(elapsed: Duration, bytes: u64) {
    counter!("model_loader_loads_total", "outcome" => "success").increment(1);
    counter!("model_loader_bytes_downloaded_total").increment(bytes);
    histogram!("model_loader_load_seconds").record(elapsed.as_secs_f64());
}

/// A failed load, labelled by error kind.
pub fn record_load_failure(kind: &'static str) {
    counter!("model_loader_loads_total", "outcome" => "failure", "kind" => kind).increment(1);
}

pub fn record_validation(ok: bool) {
    let outcome = if ok { "success" } else { "failure" };
    counter!("model_loader_validations_total", "outcome" => outcome).increment(1);
}

pub fn record_prediction(ok: bool) {
    let outcome = if ok { "success" } else { "failure" };
    counter!("model_loader_predictions_total", "outcome" => outcome).increment(1);
}
