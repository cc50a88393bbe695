//! Loader configuration from environment variables.
//!
//! Every value has a default; invalid values fall back to it without
//! crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `BASE_MODEL_NAME` | model_1.0.0.mlmodel | Model used when none is named |
//! | `MEMORY_ONLY_MODE` | False | Stream into memory instead of temp files |
//! | `MODEL_LOADER_FALLBACK_FOLDER` | base_model | Folder tried after the default one |
//! | `MODEL_LOADER_SCRATCH_DIR` | system temp | Directory for scratch files |
//! | `MODEL_LOADER_STORAGE_MANIFEST` | models.toml | Storage layout manifest |
//! | `MODEL_LOADER_HTTP_TIMEOUT` | 300 | Per-request transport timeout (secs) |
//! | `MODEL_LOADER_SINGLE_FLIGHT` | true | One concurrent cold load per model |
//! | `MODEL_LOADER_PREPROCESSOR` | stopwords | `stopwords` or `lowercase` |
//! | `MODEL_LOADER_LOG_FORMAT` | json | `json` or `pretty` |
//! | `MODEL_LOADER_LOG_LEVEL` | info | `EnvFilter` directive |
//! | `MODEL_LOADER_LOG_FILE` | (stderr) | Log file path |

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::models::{LoaderOptions, DEFAULT_FALLBACK_FOLDER};
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_BASE_MODEL_NAME: &str = "model_1.0.0.mlmodel";
pub const DEFAULT_STORAGE_MANIFEST: &str = "models.toml";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Which text preprocessor `predict` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprocessorKind {
    StopWords,
    Lowercase,
}

/// All loader configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub base_model_name: String,
    pub memory_only: bool,
    pub scratch_dir: Option<PathBuf>,
    pub storage_manifest: PathBuf,
    pub http_timeout: Duration,
    pub loader: LoaderOptions,
    pub preprocessor: PreprocessorKind,
    pub log: LogConfig,
}

/// Effective configuration summary, printed by `config show`.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub base_model_name: String,
    pub memory_only: bool,
    pub fallback_folder: String,
    pub scratch_dir: Option<String>,
    pub storage_manifest: String,
    pub http_timeout_secs: u64,
    pub single_flight: bool,
    pub preprocessor: PreprocessorKind,
    pub log_level: String,
}

/// Parse a boolean flag. Accepts Python-style `True`/`False` as well.
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Non-empty string env var.
fn parse_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn load_log_config() -> LogConfig {
    let format = parse_string("MODEL_LOADER_LOG_FORMAT")
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or_default();
    LogConfig {
        format,
        level: parse_string("MODEL_LOADER_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        output_path: parse_string("MODEL_LOADER_LOG_FILE").map(PathBuf::from),
    }
}

fn load_preprocessor() -> PreprocessorKind {
    match parse_string("MODEL_LOADER_PREPROCESSOR").as_deref() {
        Some("lowercase") | Some("none") => PreprocessorKind::Lowercase,
        _ => PreprocessorKind::StopWords,
    }
}

/// Load all configuration from environment variables.
pub fn load() -> EnvConfig {
    let timeout_secs = parse_u64("MODEL_LOADER_HTTP_TIMEOUT", DEFAULT_HTTP_TIMEOUT_SECS).max(1);

    EnvConfig {
        base_model_name: parse_string("BASE_MODEL_NAME")
            .unwrap_or_else(|| DEFAULT_BASE_MODEL_NAME.to_string()),
        memory_only: parse_bool("MEMORY_ONLY_MODE", false),
        scratch_dir: parse_string("MODEL_LOADER_SCRATCH_DIR").map(PathBuf::from),
        storage_manifest: parse_string("MODEL_LOADER_STORAGE_MANIFEST")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_MANIFEST)),
        http_timeout: Duration::from_secs(timeout_secs),
        loader: LoaderOptions {
            fallback_folder: parse_string("MODEL_LOADER_FALLBACK_FOLDER")
                .unwrap_or_else(|| DEFAULT_FALLBACK_FOLDER.to_string()),
            single_flight: parse_bool("MODEL_LOADER_SINGLE_FLIGHT", true),
        },
        preprocessor: load_preprocessor(),
        log: load_log_config(),
    }
}

impl EnvConfig {
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            base_model_name: self.base_model_name.clone(),
            memory_only: self.memory_only,
            fallback_folder: self.loader.fallback_folder.clone(),
            scratch_dir: self.scratch_dir.as_ref().map(|p| p.display().to_string()),
            storage_manifest: self.storage_manifest.display().to_string(),
            http_timeout_secs: self.http_timeout.as_secs(),
            single_flight: self.loader.single_flight,
            preprocessor: self.preprocessor,
            log_level: self.log.level.clone(),
        }
    }
}
