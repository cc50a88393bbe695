//! Model loading for the intent service.
//!
//! Resolves model names to download URLs, probes or streams the artifact
//! through scratch storage, deserializes it and caches the handle.

pub mod storage;

mod cache;
mod deserializer;
mod error;
mod flight;
mod handle;
mod loader;
mod probe;
mod resolver;
mod scratch;
mod transport;

pub use cache::{CacheEntry, ModelCache};
pub use deserializer::{
    DeserializeError, KeywordIntentModel, KeywordModelDeserializer, ModelDeserializer,
};
pub use error::LoaderError;
pub use flight::{LoadGate, LoadPermit};
pub use handle::{
    extract_metadata, IntentModel, MetadataValue, ModelHandle, ModelMetadata, Predictor,
    DEFAULT_MODEL_VERSION,
};
pub use loader::{
    LoadResult, LoadSummary, LoaderOptions, LoaderParts, StreamingLoader, CHUNK_SIZE,
    PROGRESS_INTERVAL,
};
pub use probe::{MetadataProbe, ProbeMetadata};
pub use resolver::{
    ModelResolver, StorageBackend, StorageLocation, StreamInfo, DEFAULT_FALLBACK_FOLDER,
};
pub use scratch::{
    scratch_provider, ArtifactBytes, DiskScratchProvider, MemoryScratchProvider, ScratchArtifact,
    ScratchBuffer, ScratchKind, ScratchProvider, SCRATCH_SUFFIX, VIRTUAL_TEMP_DIR,
};
pub use storage::{ManifestStorage, StorageManifest, StorageManifestError};
pub use transport::{BodyReader, GetResponse, HeadResponse, HttpTransport, Transport};
