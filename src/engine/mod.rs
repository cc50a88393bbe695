//! Prediction engine.
//!
//! Text preprocessing, the `predict` convenience wrapper and normalization of
//! heterogeneous model outputs.

pub mod output;
pub mod predict;
pub mod preprocess;

pub use output::{normalize_output, NormalizedOutput, PredictionResult};
pub use predict::{IntentPredictor, MAX_TEXT_BYTES};
pub use preprocess::{LowercasePreprocessor, StopWordPreprocessor, TextPreprocessor};
