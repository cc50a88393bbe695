// Copyright 2024-2026 Model Loader Contributors
// SPDX-License-Identifier: Apache-2.0

//! Storage backend described by a TOML manifest.
//!
//! Maps model names to download URLs per folder. Useful when the blob store
//! publishes stable shared links and no vendor SDK is wanted in-process.
//!
//! ```toml
//! [default]
//! "model_1.0.0.mlmodel" = "https://blobs.example.com/models/model_1.0.0.mlmodel"
//!
//! [folders.base_model]
//! "model_1.0.0.mlmodel" = "https://blobs.example.com/base/model_1.0.0.mlmodel"
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error::LoaderError;
use super::resolver::{StorageBackend, StreamInfo};

#[derive(Debug, Error)]
pub enum StorageManifestError {
    #[error("failed to read storage manifest: {0}")]
    Read(#[from] std::io::Error),

    #[error("invalid storage manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid URL for {model} in {folder}: {url}")]
    InvalidUrl { model: String, folder: String, url: String },
}

/// Folder layout of the remote store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageManifest {
    /// Models in the default folder.
    #[serde(default)]
    pub default: HashMap<String, String>,
    /// Named subfolders such as `base_model`.
    #[serde(default)]
    pub folders: HashMap<String, HashMap<String, String>>,
}

impl StorageManifest {
    pub fn from_file(path: &Path) -> Result<Self, StorageManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, StorageManifestError> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Every URL must be http(s).
    pub fn validate(&self) -> Result<(), StorageManifestError> {
        let tables = std::iter::once(("default", &self.default))
            .chain(self.folders.iter().map(|(name, table)| (name.as_str(), table)));
        for (folder, table) in tables {
            for (model, url) in table {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(StorageManifestError::InvalidUrl {
                        model: model.clone(),
                        folder: folder.to_string(),
                        url: url.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn lookup(&self, model_name: &str, folder: Option<&str>) -> Option<&str> {
        let table = match folder {
            None => Some(&self.default),
            Some(name) => self.folders.get(name),
        };
        table.and_then(|t| t.get(model_name)).map(String::as_str)
    }
}

/// `StorageBackend` answering from a `StorageManifest`.
pub struct ManifestStorage {
    manifest: StorageManifest,
}

impl ManifestStorage {
    pub fn new(manifest: StorageManifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &StorageManifest {
        &self.manifest
    }
}

#[async_trait]
impl StorageBackend for ManifestStorage {
    async fn stream_url(
        &self,
        model_name: &str,
        folder: Option<&str>,
    ) -> Result<StreamInfo, LoaderError> {
        Ok(match self.manifest.lookup(model_name, folder) {
            Some(url) => StreamInfo::found(url),
            None => StreamInfo::missing(),
        })
    }
}
