// Copyright 2024-2026 Model Loader Contributors
// SPDX-License-Identifier: Apache-2.0

//! Model CLI subcommands: load, validate, predict.
//!
//! Each command prints one JSON document to stdout and maps the outcome to
//! an exit code.

use serde::Serialize;

use crate::models::LoadSummary;
use crate::ModelService;

/// Run `load [MODEL]`. Returns 0 on success, 1 on load failure.
pub async fn run_load(service: &ModelService, model_name: Option<&str>) -> i32 {
    let result = service.load(model_name, false).await;
    print_json(&result.summary());
    exit_code(result.success)
}

/// Run `validate [MODEL]`: HEAD probe only, nothing is downloaded.
pub async fn run_validate(service: &ModelService, model_name: Option<&str>) -> i32 {
    let result = match model_name {
        Some(name) => service.load(Some(name), true).await,
        None => service.validate_base_model().await,
    };
    print_json(&result.summary());
    exit_code(result.success)
}

/// Run `predict TEXT [MODEL]`.
pub async fn run_predict(service: &ModelService, text: &str, model_name: Option<&str>) -> i32 {
    let result = service.predict(text, model_name).await;
    print_json(&result);
    exit_code(result.success)
}

fn exit_code(success: bool) -> i32 {
    if success {
        0
    } else {
        1
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// One-line human summary of a load, for stderr.
pub fn describe(summary: &LoadSummary) -> String {
    if summary.success {
        format!(
            "ok ({}, {} bytes, {:.1} ms)",
            if summary.from_cache { "cached" } else { "fresh" },
            summary.bytes_downloaded,
            summary.load_time_ms
        )
    } else {
        format!("failed: {}", summary.errors.join("; "))
    }
}
