//! Turning completed scratch artifacts into model handles.
//!
//! `ModelDeserializer` is the seam; `KeywordModelDeserializer` reads the JSON
//! keyword intent format produced by the training pipeline's export step.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::error::LoaderError;
use super::handle::{IntentModel, ModelHandle, Predictor};
use super::scratch::ScratchArtifact;

#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("cannot read artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model format: {0}")]
    Format(String),
}

/// Parses a scratch artifact into a model handle.
pub trait ModelDeserializer: Send + Sync {
    fn deserialize(&self, artifact: &ScratchArtifact<'_>) -> Result<ModelHandle, DeserializeError>;
}

/// Keyword-scored intent model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordIntentModel {
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub user_defined_metadata: HashMap<String, String>,
    /// Labels in output order.
    pub classes: Vec<String>,
    /// Trigger words per class. Matching is on preprocessed tokens.
    #[serde(default)]
    pub keywords: HashMap<String, Vec<String>>,
}

impl KeywordIntentModel {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let model: Self = serde_json::from_slice(bytes)
            .map_err(|e| DeserializeError::Format(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), DeserializeError> {
        if self.classes.is_empty() {
            return Err(DeserializeError::Format("classes cannot be empty".into()));
        }
        if let Some(unknown) = self.keywords.keys().find(|k| !self.classes.contains(*k)) {
            return Err(DeserializeError::Format(format!(
                "keywords reference unknown class '{}'",
                unknown
            )));
        }
        Ok(())
    }

    /// Smoothed keyword-hit distribution over `classes`.
    fn score(&self, text: &str) -> Vec<f64> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let raw: Vec<f64> = self
            .classes
            .iter()
            .map(|class| {
                let hits = self.keywords.get(class).map_or(0, |words| {
                    tokens.iter().filter(|t| words.iter().any(|w| w.as_str() == **t)).count()
                });
                hits as f64 + 1.0
            })
            .collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|v| v / total).collect()
    }
}

impl Predictor for KeywordIntentModel {
    fn predict(&self, input: &Map<String, Value>) -> Result<Value, LoaderError> {
        let text = input
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| LoaderError::Prediction("input has no 'text' field".into()))?;

        let probabilities = self.score(text);
        let best = probabilities
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > probabilities[best] { i } else { best });

        Ok(json!({
            "intent": self.classes[best],
            "probabilities": probabilities,
        }))
    }
}

impl IntentModel for KeywordIntentModel {
    fn predictor(&self) -> Option<&dyn Predictor> {
        Some(self)
    }

    fn user_defined_metadata(&self) -> Option<&HashMap<String, String>> {
        Some(&self.user_defined_metadata)
    }

    fn classes(&self) -> Option<&[String]> {
        Some(&self.classes)
    }

    fn short_description(&self) -> Option<&str> {
        Some(&self.short_description)
    }

    fn license(&self) -> Option<&str> {
        Some(&self.license)
    }
}

/// Deserializer for `KeywordIntentModel` JSON artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordModelDeserializer;

impl ModelDeserializer for KeywordModelDeserializer {
    fn deserialize(&self, artifact: &ScratchArtifact<'_>) -> Result<ModelHandle, DeserializeError> {
        let bytes = artifact.bytes()?;
        let model = KeywordIntentModel::from_slice(&bytes)?;
        Ok(Arc::new(model))
    }
}
