// Copyright 2024-2026 Model Loader Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for the model loader.
//!
//! ## Usage
//!
//! ```bash
//! model-loader-cli load [MODEL]           # Stream, deserialize and cache
//! model-loader-cli validate [MODEL]       # HEAD probe only
//! model-loader-cli predict TEXT [MODEL]   # Load on demand and predict
//! model-loader-cli config show            # Effective configuration
//! ```

pub mod config_cmd;
pub mod models_cmd;

pub use models_cmd::{describe, run_load, run_predict, run_validate};

/// Exit code when the service cannot be built from configuration.
pub const EXIT_SETUP_FAILURE: i32 = 3;
