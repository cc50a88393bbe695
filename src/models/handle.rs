//! Loaded model handles and their metadata.
//!
//! A handle is whatever the deserializer produced. Every capability is
//! optional; callers probe for it rather than assuming a concrete type.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::LoaderError;

/// Version reported when a model carries no `version` in its user metadata.
pub const DEFAULT_MODEL_VERSION: &str = "1.0.0";

/// A metadata value: either free text or a byte count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Number(u64),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for MetadataValue {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// String keyed metadata attached to load and probe results.
pub type ModelMetadata = BTreeMap<String, MetadataValue>;

/// Prediction capability of a loaded model.
///
/// Output shapes vary between model families, so the raw value is returned
/// and normalized by the caller.
pub trait Predictor: Send + Sync {
    fn predict(&self, input: &Map<String, Value>) -> Result<Value, LoaderError>;
}

/// A deserialized model. All accessors default to "not exposed".
pub trait IntentModel: Send + Sync {
    /// Prediction capability, if the model has one.
    fn predictor(&self) -> Option<&dyn Predictor> {
        None
    }

    fn user_defined_metadata(&self) -> Option<&HashMap<String, String>> {
        None
    }

    /// Class labels in output order.
    fn classes(&self) -> Option<&[String]> {
        None
    }

    fn short_description(&self) -> Option<&str> {
        None
    }

    fn license(&self) -> Option<&str> {
        None
    }
}

/// Shared handle to a loaded model. Cloned out of the cache for every caller.
pub type ModelHandle = Arc<dyn IntentModel>;

/// Extract the description/license/version metadata set from a handle.
pub fn extract_metadata(model: &dyn IntentModel) -> ModelMetadata {
    let version = model
        .user_defined_metadata()
        .and_then(|m| m.get("version"))
        .map(String::as_str)
        .unwrap_or(DEFAULT_MODEL_VERSION);

    let mut metadata = ModelMetadata::new();
    metadata.insert(
        "description".into(),
        model.short_description().unwrap_or_default().into(),
    );
    metadata.insert("license".into(), model.license().unwrap_or_default().into());
    metadata.insert("version".into(), version.into());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl IntentModel for Bare {}

    struct Described {
        metadata: HashMap<String, String>,
    }

    impl IntentModel for Described {
        fn user_defined_metadata(&self) -> Option<&HashMap<String, String>> {
            Some(&self.metadata)
        }
        fn short_description(&self) -> Option<&str> {
            Some("Intent classifier")
        }
        fn license(&self) -> Option<&str> {
            Some("MIT")
        }
    }

    #[test]
    fn test_bare_model_gets_defaults() {
        let metadata = extract_metadata(&Bare);
        assert_eq!(metadata["description"], MetadataValue::from(""));
        assert_eq!(metadata["license"], MetadataValue::from(""));
        assert_eq!(metadata["version"], MetadataValue::from(DEFAULT_MODEL_VERSION));
        assert!(Bare.predictor().is_none());
    }

    #[test]
    fn test_described_model_reports_its_version() {
        let mut user = HashMap::new();
        user.insert("version".to_string(), "2.4.1".to_string());
        let model = Described { metadata: user };

        let metadata = extract_metadata(&model);
        assert_eq!(metadata["description"].as_str(), Some("Intent classifier"));
        assert_eq!(metadata["license"].as_str(), Some("MIT"));
        assert_eq!(metadata["version"].as_str(), Some("2.4.1"));
    }

    #[test]
    fn test_metadata_value_serializes_untagged() {
        let mut metadata = ModelMetadata::new();
        metadata.insert("etag".into(), "\"abc\"".into());
        metadata.insert("file_size".into(), 2048u64.into());
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["file_size"], 2048);
        assert_eq!(json["etag"], "\"abc\"");
    }
}
