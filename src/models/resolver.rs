//! Download URL resolution across storage locations.
//!
//! Locations are tried in order; the first one that yields a URL wins.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::LoaderError;

/// Folder used when the default location has no copy of the model.
pub const DEFAULT_FALLBACK_FOLDER: &str = "base_model";

/// Streaming info returned by a storage backend for one folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub success: bool,
    pub download_url: Option<String>,
}

impl StreamInfo {
    pub fn found(url: impl Into<String>) -> Self {
        Self { success: true, download_url: Some(url.into()) }
    }

    pub fn missing() -> Self {
        Self::default()
    }

    /// URL if the backend reported success and actually provided one.
    pub fn url(&self) -> Option<&str> {
        if self.success {
            self.download_url.as_deref()
        } else {
            None
        }
    }
}

/// Remote blob store that can mint time-limited download URLs.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Ask for a download URL for `model_name` in `folder` (`None` = default).
    async fn stream_url(
        &self,
        model_name: &str,
        folder: Option<&str>,
    ) -> Result<StreamInfo, LoaderError>;
}

/// One place a model may live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    Default,
    Folder(String),
}

impl StorageLocation {
    fn folder(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Folder(name) => Some(name),
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Folder(name) => f.write_str(name),
        }
    }
}

/// Resolves model names to download URLs.
pub struct ModelResolver {
    storage: Arc<dyn StorageBackend>,
    locations: Vec<StorageLocation>,
}

impl ModelResolver {
    /// Resolver over the default location followed by `fallback_folder`.
    pub fn new(storage: Arc<dyn StorageBackend>, fallback_folder: &str) -> Self {
        Self::with_locations(
            storage,
            vec![StorageLocation::Default, StorageLocation::Folder(fallback_folder.to_string())],
        )
    }

    pub fn with_locations(storage: Arc<dyn StorageBackend>, locations: Vec<StorageLocation>) -> Self {
        Self { storage, locations }
    }

    pub fn locations(&self) -> &[StorageLocation] {
        &self.locations
    }

    /// Resolve `model_name` to a download URL.
    pub async fn resolve(&self, model_name: &str) -> Result<String, LoaderError> {
        for location in &self.locations {
            match self.storage.stream_url(model_name, location.folder()).await {
                Ok(info) => {
                    if let Some(url) = info.url() {
                        info!(model = model_name, %location, "Found model download URL");
                        return Ok(url.to_string());
                    }
                    debug!(model = model_name, %location, "Model not present in location");
                }
                Err(e) => {
                    debug!(model = model_name, %location, error = %e, "Could not get model stream");
                }
            }
        }

        warn!(model = model_name, "Could not find download URL for model");
        Err(LoaderError::Resolution(model_name.to_string()))
    }
}
