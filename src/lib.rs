//! Model Loader
//!
//! Memory-efficient loading of intent-classification models from remote
//! storage.
//!
//! # Flow
//!
//! - Resolve: model name to download URL, default location first, then the
//!   fallback folder
//! - Validate: HEAD request only, metadata from response headers
//! - Load: stream the body in 1 MiB chunks into disk or memory scratch
//!   storage, deserialize, cache the handle
//! - Predict: load on demand, preprocess text, normalize model output
//!
//! Loaded models live in a process-wide cache shared by every caller of the
//! same [`ModelService`].

pub mod cli;
pub mod config;
pub mod engine;
pub mod models;
pub mod telemetry;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use config::{EnvConfig, PreprocessorKind};
use engine::{
    IntentPredictor, LowercasePreprocessor, PredictionResult, StopWordPreprocessor,
    TextPreprocessor,
};
use models::{
    scratch_provider, HttpTransport, KeywordModelDeserializer, LoadResult, LoaderError,
    LoaderParts, ManifestStorage, ModelCache, StorageManifest, StorageManifestError,
    StreamingLoader,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Storage manifest error: {0}")]
    Manifest(#[from] StorageManifestError),
    #[error(transparent)]
    Loader(#[from] LoaderError),
}

/// Loader, cache and predictor wired together from configuration.
pub struct ModelService {
    loader: Arc<StreamingLoader>,
    predictor: IntentPredictor,
    base_model_name: String,
}

impl ModelService {
    /// Build a service with the HTTP transport and manifest storage backend.
    pub fn from_config(config: &EnvConfig) -> Result<Self, ServiceError> {
        let manifest = StorageManifest::from_file(&config.storage_manifest)?;
        let parts = LoaderParts {
            cache: Arc::new(ModelCache::new()),
            storage: Arc::new(ManifestStorage::new(manifest)),
            transport: Arc::new(HttpTransport::new(config.http_timeout)?),
            scratch: scratch_provider(config.memory_only, config.scratch_dir.clone()),
            deserializer: Arc::new(KeywordModelDeserializer),
        };
        Ok(Self::with_parts(parts, config))
    }

    /// Build a service from caller-supplied collaborators.
    pub fn with_parts(parts: LoaderParts, config: &EnvConfig) -> Self {
        let loader = Arc::new(StreamingLoader::new(parts, config.loader.clone()));
        let preprocessor: Arc<dyn TextPreprocessor> = match config.preprocessor {
            PreprocessorKind::StopWords => Arc::new(StopWordPreprocessor::english()),
            PreprocessorKind::Lowercase => Arc::new(LowercasePreprocessor),
        };
        let predictor = IntentPredictor::new(loader.clone(), config.base_model_name.clone())
            .with_preprocessor(preprocessor);

        info!(
            scratch = ?loader.scratch_kind(),
            base_model = %config.base_model_name,
            "Model service initialized"
        );

        Self {
            loader,
            predictor,
            base_model_name: config.base_model_name.clone(),
        }
    }

    pub fn loader(&self) -> &Arc<StreamingLoader> {
        &self.loader
    }

    pub fn base_model_name(&self) -> &str {
        &self.base_model_name
    }

    /// Load `model_name`, or the base model when `None`.
    pub async fn load(&self, model_name: Option<&str>, validation_only: bool) -> LoadResult {
        self.loader
            .load(model_name.unwrap_or(&self.base_model_name), validation_only)
            .await
    }

    pub async fn predict(&self, text: &str, model_name: Option<&str>) -> PredictionResult {
        self.predictor.predict(text, model_name).await
    }

    /// Confirm at startup that the base model is reachable.
    ///
    /// Only probes the artifact; nothing is downloaded or cached.
    pub async fn validate_base_model(&self) -> LoadResult {
        let result = self.loader.load(&self.base_model_name, true).await;
        if result.success {
            info!(
                model = %self.base_model_name,
                size = ?result.metadata.get("file_size").and_then(|v| v.as_u64()),
                "Base model validated"
            );
        } else {
            warn!(
                model = %self.base_model_name,
                errors = %result.errors.join(", "),
                "Base model validation failed"
            );
        }
        result
    }
}
