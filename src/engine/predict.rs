//! Prediction convenience wrapper over the streaming loader.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{error, warn};

use super::output::{normalize_output, PredictionResult};
use super::preprocess::{LowercasePreprocessor, TextPreprocessor};
use crate::models::{LoaderError, StreamingLoader};
use crate::telemetry;

/// Maximum input text size in bytes (64KB).
pub const MAX_TEXT_BYTES: usize = 65_536;

/// Loads models on demand and runs intent prediction on them.
pub struct IntentPredictor {
    loader: Arc<StreamingLoader>,
    preprocessor: Option<Arc<dyn TextPreprocessor>>,
    default_model: String,
}

impl IntentPredictor {
    pub fn new(loader: Arc<StreamingLoader>, default_model: impl Into<String>) -> Self {
        Self { loader, preprocessor: None, default_model: default_model.into() }
    }

    pub fn with_preprocessor(mut self, preprocessor: Arc<dyn TextPreprocessor>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Predict the intent of `text` with `model_name` (or the default model).
    pub async fn predict(&self, text: &str, model_name: Option<&str>) -> PredictionResult {
        let result = self.predict_inner(text, model_name.unwrap_or(&self.default_model)).await;
        telemetry::record_prediction(result.success);
        result
    }

    async fn predict_inner(&self, text: &str, model_name: &str) -> PredictionResult {
        if text.len() > MAX_TEXT_BYTES {
            let err = LoaderError::Prediction(format!(
                "input is {} bytes, limit is {}",
                text.len(),
                MAX_TEXT_BYTES
            ));
            return PredictionResult::failed(vec![err.to_string()]);
        }

        let loaded = self.loader.load(model_name, false).await;
        let model = match loaded.model {
            Some(model) if loaded.success => model,
            _ => {
                error!(
                    model = model_name,
                    errors = %loaded.errors.join(", "),
                    "Failed to load model for prediction"
                );
                return PredictionResult::failed(loaded.errors);
            }
        };

        let processed = match &self.preprocessor {
            Some(pre) => pre.preprocess(text),
            None => LowercasePreprocessor.preprocess(text),
        };

        let Some(predictor) = model.predictor() else {
            let err = LoaderError::UnsupportedModel("no predict method".into());
            error!(model = model_name, "{}", err);
            return PredictionResult::failed(vec![err.to_string()]);
        };

        let mut input = Map::new();
        input.insert("text".into(), Value::String(processed));

        let output = match predictor.predict(&input) {
            Ok(output) => output,
            Err(e) => {
                error!(model = model_name, error = %e, "Prediction failed");
                let msg = if matches!(e, LoaderError::Prediction(_)) {
                    e.to_string()
                } else {
                    LoaderError::Prediction(e.to_string()).to_string()
                };
                return PredictionResult::failed(vec![msg]);
            }
        };

        let normalized = normalize_output(&output, model.classes());
        let mut result = PredictionResult {
            success: normalized.intent.is_some(),
            intent: normalized.intent,
            probabilities: normalized.probabilities,
            errors: Vec::new(),
        };
        if !result.success {
            warn!(model = model_name, "Prediction output contained no intent");
            result.errors.push("Prediction output contained no intent".to_string());
        }
        result
    }
}
