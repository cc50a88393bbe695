//! Shared stubs for loader integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use model_loader::models::{
    GetResponse, HeadResponse, IntentModel, LoaderError, LoaderOptions, LoaderParts, ModelCache,
    ModelDeserializer, ModelHandle, Predictor, ScratchArtifact, ScratchBuffer, ScratchKind,
    ScratchProvider, StorageBackend, StreamInfo, StreamingLoader, Transport,
};

pub const MIB: usize = 1024 * 1024;

/// Keyword model artifact understood by `KeywordModelDeserializer`.
pub fn keyword_model_json() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "short_description": "Greeting detector",
        "license": "MIT",
        "user_defined_metadata": {"version": "2.1.0"},
        "classes": ["greeting", "farewell"],
        "keywords": {
            "greeting": ["hello", "hi", "morning"],
            "farewell": ["bye", "goodbye", "later"]
        }
    }))
    .unwrap()
}

pub fn url_for(name: &str) -> String {
    format!("https://models.example.com/{}", name)
}

/// In-memory storage backend keyed by (folder, model name).
#[derive(Default)]
pub struct MapStorage {
    urls: HashMap<(Option<String>, String), String>,
    pub calls: AtomicUsize,
}

impl MapStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, folder: Option<&str>, name: &str) -> Self {
        self.urls.insert((folder.map(String::from), name.to_string()), url_for(name));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for MapStorage {
    async fn stream_url(
        &self,
        model_name: &str,
        folder: Option<&str>,
    ) -> Result<StreamInfo, LoaderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (folder.map(String::from), model_name.to_string());
        Ok(match self.urls.get(&key) {
            Some(url) => StreamInfo::found(url.clone()),
            None => StreamInfo::missing(),
        })
    }
}

/// Serves fixed bodies per URL; unknown URLs answer 404.
#[derive(Default)]
pub struct StubTransport {
    bodies: HashMap<String, Vec<u8>>,
    pub heads: AtomicUsize,
    pub gets: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, name: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url_for(name), body);
        self
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn head(&self, url: &str) -> Result<HeadResponse, LoaderError> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        let mut headers = HashMap::new();
        let status = match self.bodies.get(url) {
            Some(body) => {
                headers.insert("content-length".to_string(), body.len().to_string());
                headers.insert("content-type".to_string(), "application/json".to_string());
                headers.insert("etag".to_string(), "\"v1\"".to_string());
                200
            }
            None => 404,
        };
        Ok(HeadResponse { status, headers })
    }

    async fn get(&self, url: &str) -> Result<GetResponse, LoaderError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(match self.bodies.get(url) {
            Some(body) => GetResponse {
                status: 200,
                content_length: Some(body.len() as u64),
                body: Box::new(io::Cursor::new(body.clone())),
            },
            None => GetResponse {
                status: 404,
                content_length: None,
                body: Box::new(io::Cursor::new(Vec::new())),
            },
        })
    }
}

/// Model with every capability left at its default.
pub struct BareModel;

impl IntentModel for BareModel {}

/// Model whose predictor returns a fixed output.
pub struct FixedOutputModel(pub Value);

impl Predictor for FixedOutputModel {
    fn predict(&self, _input: &Map<String, Value>) -> Result<Value, LoaderError> {
        Ok(self.0.clone())
    }
}

impl IntentModel for FixedOutputModel {
    fn predictor(&self) -> Option<&dyn Predictor> {
        Some(self)
    }
}

/// Model whose predictor reports the text it was given as the intent.
pub struct EchoModel;

impl Predictor for EchoModel {
    fn predict(&self, input: &Map<String, Value>) -> Result<Value, LoaderError> {
        Ok(json!({ "intent": input["text"] }))
    }
}

impl IntentModel for EchoModel {
    fn predictor(&self) -> Option<&dyn Predictor> {
        Some(self)
    }
}

/// What a recording deserializer saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub kind: ScratchKind,
    pub len: usize,
}

/// Records each artifact and hands out a fixed model.
pub struct RecordingDeserializer {
    model: ModelHandle,
    pub seen: Mutex<Vec<Seen>>,
}

impl RecordingDeserializer {
    pub fn new(model: ModelHandle) -> Self {
        Self { model, seen: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

impl ModelDeserializer for RecordingDeserializer {
    fn deserialize(
        &self,
        artifact: &ScratchArtifact<'_>,
    ) -> Result<ModelHandle, model_loader::models::DeserializeError> {
        let len = artifact.bytes()?.len();
        self.seen.lock().push(Seen { kind: artifact.kind(), len });
        Ok(self.model.clone())
    }
}

/// Wraps a provider and counts buffers created and released.
pub struct CountingScratch {
    inner: Arc<dyn ScratchProvider>,
    pub created: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
}

impl CountingScratch {
    pub fn new(inner: Arc<dyn ScratchProvider>) -> Self {
        Self {
            inner,
            created: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ScratchProvider for CountingScratch {
    fn kind(&self) -> ScratchKind {
        self.inner.kind()
    }

    fn create(&self) -> io::Result<Box<dyn ScratchBuffer>> {
        let inner = self.inner.create()?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedBuffer { inner, released: self.released.clone() }))
    }
}

struct CountedBuffer {
    inner: Box<dyn ScratchBuffer>,
    released: Arc<AtomicUsize>,
}

impl ScratchBuffer for CountedBuffer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> ScratchKind {
        self.inner.kind()
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.inner.write_chunk(chunk)
    }

    fn bytes_written(&self) -> u64 {
        self.inner.bytes_written()
    }

    fn artifact(&mut self) -> io::Result<ScratchArtifact<'_>> {
        self.inner.artifact()
    }

    fn release(self: Box<Self>) -> io::Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release()
    }
}

pub fn loader(
    storage: Arc<dyn StorageBackend>,
    transport: Arc<dyn Transport>,
    scratch: Arc<dyn ScratchProvider>,
    deserializer: Arc<dyn ModelDeserializer>,
) -> StreamingLoader {
    StreamingLoader::new(
        LoaderParts {
            cache: Arc::new(ModelCache::new()),
            storage,
            transport,
            scratch,
            deserializer,
        },
        LoaderOptions::default(),
    )
}

pub fn dir_entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
