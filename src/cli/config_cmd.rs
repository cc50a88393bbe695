// Copyright 2024-2026 Model Loader Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables
//! and never touch remote storage.

use crate::config::{self, EffectiveConfig, EnvConfig};
use crate::models::StorageManifest;

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print_config(&cfg);
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    println!("BASE_MODEL_NAME={}", config::DEFAULT_BASE_MODEL_NAME);
    println!("MEMORY_ONLY_MODE=False");
    println!("MODEL_LOADER_FALLBACK_FOLDER={}", crate::models::DEFAULT_FALLBACK_FOLDER);
    println!("MODEL_LOADER_SCRATCH_DIR=");
    println!("MODEL_LOADER_STORAGE_MANIFEST={}", config::DEFAULT_STORAGE_MANIFEST);
    println!("MODEL_LOADER_HTTP_TIMEOUT={}", config::DEFAULT_HTTP_TIMEOUT_SECS);
    println!("MODEL_LOADER_SINGLE_FLIGHT=true");
    println!("MODEL_LOADER_PREPROCESSOR=stopwords");
    println!("MODEL_LOADER_LOG_FORMAT=json");
    println!("MODEL_LOADER_LOG_LEVEL=info");
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let warnings = collect_warnings(&config::load());
    for w in &warnings {
        eprintln!("WARNING: {}", w);
    }
    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

fn collect_warnings(env: &EnvConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    match StorageManifest::from_file(&env.storage_manifest) {
        Ok(manifest) => {
            if manifest.lookup(&env.base_model_name, None).is_none()
                && manifest
                    .lookup(&env.base_model_name, Some(&env.loader.fallback_folder))
                    .is_none()
            {
                warnings.push(format!(
                    "BASE_MODEL_NAME ({}) is not listed in {}",
                    env.base_model_name,
                    env.storage_manifest.display()
                ));
            }
        }
        Err(e) => warnings.push(e.to_string()),
    }

    if !env.memory_only {
        if let Some(dir) = &env.scratch_dir {
            if !dir.is_dir() {
                warnings.push(format!(
                    "MODEL_LOADER_SCRATCH_DIR ({}) is not a directory",
                    dir.display()
                ));
            }
        }
    }

    warnings
}

fn print_config(cfg: &EffectiveConfig) {
    println!("BASE_MODEL_NAME={}", cfg.base_model_name);
    println!("MEMORY_ONLY_MODE={}", if cfg.memory_only { "True" } else { "False" });
    println!("MODEL_LOADER_FALLBACK_FOLDER={}", cfg.fallback_folder);
    println!("MODEL_LOADER_SCRATCH_DIR={}", cfg.scratch_dir.as_deref().unwrap_or(""));
    println!("MODEL_LOADER_STORAGE_MANIFEST={}", cfg.storage_manifest);
    println!("MODEL_LOADER_HTTP_TIMEOUT={}", cfg.http_timeout_secs);
    println!("MODEL_LOADER_SINGLE_FLIGHT={}", cfg.single_flight);
    println!(
        "MODEL_LOADER_PREPROCESSOR={}",
        match cfg.preprocessor {
            config::PreprocessorKind::StopWords => "stopwords",
            config::PreprocessorKind::Lowercase => "lowercase",
        }
    );
    println!("MODEL_LOADER_LOG_LEVEL={}", cfg.log_level);
}
