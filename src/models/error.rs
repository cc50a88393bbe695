//! Loader error types.
//!
//! Errors are recovered into `LoadResult::errors` at the public surface;
//! nothing here is raised past `StreamingLoader::load` or `predict`.

use thiserror::Error;

/// Errors that can occur while resolving, downloading or decoding a model.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Could not get download URL for model {0}")]
    Resolution(String),

    #[error("Error downloading model: HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Error loading model {model}: {reason}")]
    Deserialization { model: String, reason: String },

    #[error("Unsupported model type - {0}")]
    UnsupportedModel(String),

    #[error("Error making prediction: {0}")]
    Prediction(String),

    #[error("Storage backend error: {0}")]
    Storage(String),

    #[error("Scratch storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoaderError {
    /// Returns true for failures caused by the network or remote store.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::HttpStatus { .. } | Self::Transport(_))
    }

    /// Short, stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution",
            Self::HttpStatus { .. } | Self::Transport(_) => "transport",
            Self::Deserialization { .. } => "deserialization",
            Self::UnsupportedModel(_) => "unsupported_model",
            Self::Prediction(_) => "prediction",
            Self::Storage(_) => "storage",
            Self::Io(_) => "io",
        }
    }
}
