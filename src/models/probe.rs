//! Header-only metadata probe.
//!
//! Used by validation-only loads: confirms a model exists and reports its
//! size and identity without transferring the body.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::LoaderError;
use super::handle::ModelMetadata;
use super::transport::Transport;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// What the remote store says about a model artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeMetadata {
    pub content_type: String,
    pub file_size: u64,
    pub last_modified: String,
    pub etag: String,
}

impl ProbeMetadata {
    pub fn into_metadata(self) -> ModelMetadata {
        let mut metadata = ModelMetadata::new();
        metadata.insert("content_type".into(), self.content_type.into());
        metadata.insert("file_size".into(), self.file_size.into());
        metadata.insert("last_modified".into(), self.last_modified.into());
        metadata.insert("etag".into(), self.etag.into());
        metadata
    }
}

/// Issues HEAD requests against resolved download URLs.
pub struct MetadataProbe {
    transport: Arc<dyn Transport>,
}

impl MetadataProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn probe(&self, url: &str) -> Result<ProbeMetadata, LoaderError> {
        let head = self.transport.head(url).await?;
        if head.status != 200 {
            warn!(status = head.status, "Failed to get model headers");
            return Err(LoaderError::HttpStatus { status: head.status });
        }

        let file_size = head
            .header("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        Ok(ProbeMetadata {
            content_type: head.header("content-type").unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
            file_size,
            last_modified: head.header("last-modified").unwrap_or_default().to_string(),
            etag: head.header("etag").unwrap_or_default().to_string(),
        })
    }
}
