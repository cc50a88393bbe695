//! Streaming model loader.
//!
//! Cache lookup, URL resolution, then either a header probe (validation-only)
//! or a chunked download into scratch storage followed by deserialization.
//! Every failure ends up in `LoadResult::errors`; `load` never returns `Err`.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{error, info, warn, Instrument};

use super::cache::{CacheEntry, ModelCache};
use super::deserializer::ModelDeserializer;
use super::error::LoaderError;
use super::flight::LoadGate;
use super::handle::{extract_metadata, ModelHandle, ModelMetadata};
use super::probe::MetadataProbe;
use super::resolver::{ModelResolver, StorageBackend, DEFAULT_FALLBACK_FOLDER};
use super::scratch::{ScratchBuffer, ScratchKind, ScratchProvider};
use super::transport::{GetResponse, Transport};
use crate::telemetry::{self, LoadSpan, SpanExt};

/// Bytes read from the response body per chunk.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Download progress is logged every this many bytes.
pub const PROGRESS_INTERVAL: u64 = 20 * 1024 * 1024;

/// Outcome of a load. Never partially valid: `success == false` implies
/// `model.is_none()`.
#[derive(Clone, Default)]
pub struct LoadResult {
    pub success: bool,
    pub model: Option<ModelHandle>,
    pub metadata: ModelMetadata,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub from_cache: bool,
    pub load_time: Duration,
    pub download_url: Option<String>,
    pub bytes_downloaded: u64,
    /// Hex SHA-256 of the downloaded body.
    pub artifact_sha256: Option<String>,
}

impl LoadResult {
    fn cached(entry: CacheEntry, elapsed: Duration) -> Self {
        Self {
            success: true,
            model: Some(entry.model),
            metadata: entry.metadata,
            from_cache: true,
            load_time: elapsed,
            ..Self::default()
        }
    }

    fn fail(&mut self, err: &LoaderError) {
        self.success = false;
        self.model = None;
        self.errors.push(err.to_string());
    }

    /// Serializable view without the model handle.
    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            success: self.success,
            metadata: self.metadata.clone(),
            errors: self.errors.clone(),
            warnings: self.warnings.clone(),
            from_cache: self.from_cache,
            load_time_ms: self.load_time.as_secs_f64() * 1000.0,
            download_url: self.download_url.clone(),
            bytes_downloaded: self.bytes_downloaded,
            artifact_sha256: self.artifact_sha256.clone(),
        }
    }
}

impl std::fmt::Debug for LoadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadResult")
            .field("success", &self.success)
            .field("has_model", &self.model.is_some())
            .field("metadata", &self.metadata)
            .field("errors", &self.errors)
            .field("warnings", &self.warnings)
            .field("from_cache", &self.from_cache)
            .field("load_time", &self.load_time)
            .field("bytes_downloaded", &self.bytes_downloaded)
            .finish()
    }
}

/// JSON shape of a `LoadResult`, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub success: bool,
    pub metadata: ModelMetadata,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub from_cache: bool,
    pub load_time_ms: f64,
    pub download_url: Option<String>,
    pub bytes_downloaded: u64,
    pub artifact_sha256: Option<String>,
}

/// Loader settings that are not collaborators.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Folder tried after the default location.
    pub fallback_folder: String,
    /// Serialize concurrent cold loads of the same name.
    pub single_flight: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            fallback_folder: DEFAULT_FALLBACK_FOLDER.to_string(),
            single_flight: true,
        }
    }
}

/// Collaborators the loader is built from.
pub struct LoaderParts {
    pub cache: Arc<ModelCache>,
    pub storage: Arc<dyn StorageBackend>,
    pub transport: Arc<dyn Transport>,
    pub scratch: Arc<dyn ScratchProvider>,
    pub deserializer: Arc<dyn ModelDeserializer>,
}

struct Fetched {
    model: ModelHandle,
    bytes: u64,
    sha256: String,
}

/// Memory-efficient model loader with a shared cache.
pub struct StreamingLoader {
    cache: Arc<ModelCache>,
    resolver: ModelResolver,
    probe: MetadataProbe,
    transport: Arc<dyn Transport>,
    scratch: Arc<dyn ScratchProvider>,
    deserializer: Arc<dyn ModelDeserializer>,
    gate: Option<LoadGate>,
}

impl StreamingLoader {
    pub fn new(parts: LoaderParts, options: LoaderOptions) -> Self {
        Self {
            cache: parts.cache,
            resolver: ModelResolver::new(parts.storage, &options.fallback_folder),
            probe: MetadataProbe::new(parts.transport.clone()),
            transport: parts.transport,
            scratch: parts.scratch,
            deserializer: parts.deserializer,
            gate: options.single_flight.then(LoadGate::new),
        }
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    pub fn scratch_kind(&self) -> ScratchKind {
        self.scratch.kind()
    }

    /// Load `model_name`, or with `validation_only` just confirm it exists.
    ///
    /// Validation-only loads never consult or populate the cache and never
    /// download the model body.
    pub async fn load(&self, model_name: &str, validation_only: bool) -> LoadResult {
        let span = LoadSpan::new(model_name, validation_only);
        let start = Instant::now();
        let result = self
            .load_inner(model_name, validation_only, start)
            .instrument(span.clone())
            .await;

        span.record("from_cache", result.from_cache);
        span.record("bytes", result.bytes_downloaded);
        span.record("latency_ms", result.load_time.as_millis() as u64);
        let status: Result<(), String> = match result.errors.first() {
            Some(e) if !result.success => Err(e.clone()),
            _ => Ok(()),
        };
        span.record_result(&status);
        result
    }

    async fn load_inner(&self, model_name: &str, validation_only: bool, start: Instant) -> LoadResult {
        if !validation_only {
            if let Some(entry) = self.cache.get(model_name) {
                info!(model = model_name, "Using cached model");
                telemetry::record_cache_hit();
                return LoadResult::cached(entry, start.elapsed());
            }
        }

        let _permit = match (&self.gate, validation_only) {
            (Some(gate), false) => {
                let permit = gate.acquire(model_name).await;
                // Another caller may have finished this load while we waited.
                if let Some(entry) = self.cache.get(model_name) {
                    info!(model = model_name, "Using cached model loaded by concurrent request");
                    telemetry::record_cache_hit();
                    return LoadResult::cached(entry, start.elapsed());
                }
                Some(permit)
            }
            _ => None,
        };

        let mut result = LoadResult::default();
        if !validation_only {
            telemetry::record_cache_miss();
        }

        let url = match self.resolver.resolve(model_name).await {
            Ok(url) => url,
            Err(e) => {
                error!(model = model_name, error = %e, "Model resolution failed");
                result.fail(&e);
                telemetry::record_load_failure(e.kind());
                result.load_time = start.elapsed();
                return result;
            }
        };
        result.download_url = Some(url.clone());

        if validation_only {
            self.validate_at(model_name, &url, &mut result).await;
        } else {
            self.load_at(model_name, &url, &mut result, start).await;
        }

        result.load_time = start.elapsed();
        result
    }

    async fn validate_at(&self, model_name: &str, url: &str, result: &mut LoadResult) {
        info!(model = model_name, "Validation only - skipping full model loading");
        match self.probe.probe(url).await {
            Ok(meta) => {
                if meta.file_size == 0 {
                    result
                        .warnings
                        .push(format!("Model {} reports no content length", model_name));
                }
                result.metadata = meta.into_metadata();
                result.success = true;
                info!(model = model_name, "Validated model without loading");
            }
            Err(e) => {
                let msg = format!("Could not validate model {} metadata: {}", model_name, e);
                warn!("{}", msg);
                result.errors.push(msg);
            }
        }
        telemetry::record_validation(result.success);
    }

    async fn load_at(&self, model_name: &str, url: &str, result: &mut LoadResult, start: Instant) {
        match self.fetch(model_name, url, &mut result.warnings).await {
            Ok(fetched) => {
                let metadata = extract_metadata(fetched.model.as_ref());
                self.cache.insert(
                    model_name,
                    CacheEntry::new(fetched.model.clone(), metadata.clone()),
                );

                result.model = Some(fetched.model);
                result.metadata = metadata;
                result.bytes_downloaded = fetched.bytes;
                result.artifact_sha256 = Some(fetched.sha256);
                result.success = true;
                telemetry::record_load_success(start.elapsed(), fetched.bytes);
                info!(model = model_name, bytes = fetched.bytes, "Successfully loaded model");
            }
            Err(e) => {
                error!(model = model_name, error = %e, "Model load failed");
                result.fail(&e);
                telemetry::record_load_failure(e.kind());
            }
        }
    }

    /// Download into fresh scratch storage and deserialize. The scratch buffer
    /// is released exactly once whatever happens after it is created.
    async fn fetch(
        &self,
        model_name: &str,
        url: &str,
        warnings: &mut Vec<String>,
    ) -> Result<Fetched, LoaderError> {
        let response = self.transport.get(url).await?;
        if response.status != 200 {
            return Err(LoaderError::HttpStatus { status: response.status });
        }

        let mut scratch = self.scratch.create()?;
        info!(
            model = model_name,
            scratch = scratch.name(),
            kind = ?scratch.kind(),
            "Streaming model into scratch storage"
        );

        let outcome = self.stream_and_decode(model_name, response, scratch.as_mut()).await;

        let scratch_name = scratch.name().to_string();
        if let Err(e) = scratch.release() {
            let msg = format!("Could not remove scratch file {}: {}", scratch_name, e);
            warn!("{}", msg);
            warnings.push(msg);
        }

        outcome
    }

    async fn stream_and_decode(
        &self,
        model_name: &str,
        response: GetResponse,
        scratch: &mut dyn ScratchBuffer,
    ) -> Result<Fetched, LoaderError> {
        let total = response.content_length.unwrap_or(0);
        let mut body = response.body;
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut hasher = Sha256::new();
        let mut downloaded = 0u64;
        let mut next_report = PROGRESS_INTERVAL;

        loop {
            let n = read_chunk(&mut body, &mut chunk)
                .await
                .map_err(|e| LoaderError::Transport(format!("download interrupted: {}", e)))?;
            if n == 0 {
                break;
            }
            scratch.write_chunk(&chunk[..n])?;
            hasher.update(&chunk[..n]);
            downloaded += n as u64;

            if downloaded >= next_report {
                info!(
                    model = model_name,
                    downloaded_mb = downloaded as f64 / (1024.0 * 1024.0),
                    total_mb = total as f64 / (1024.0 * 1024.0),
                    "Download progress"
                );
                next_report += PROGRESS_INTERVAL;
            }
        }
        drop(chunk);

        info!(
            model = model_name,
            downloaded_mb = downloaded as f64 / (1024.0 * 1024.0),
            "Download complete"
        );

        let artifact = scratch.artifact()?;
        let model = self.deserializer.deserialize(&artifact).map_err(|e| {
            LoaderError::Deserialization { model: model_name.to_string(), reason: e.to_string() }
        })?;

        Ok(Fetched {
            model,
            bytes: downloaded,
            sha256: hex::encode(hasher.finalize()),
        })
    }
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
async fn read_chunk<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
