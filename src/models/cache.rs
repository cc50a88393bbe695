//! Process-wide cache of loaded model handles.
//!
//! One mutex guards the whole map. Critical sections are a single lookup or
//! insert; callers never hold the lock across network or disk I/O.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::handle::{ModelHandle, ModelMetadata};

/// A successfully loaded model and what was learned while loading it.
#[derive(Clone)]
pub struct CacheEntry {
    pub model: ModelHandle,
    pub metadata: ModelMetadata,
    pub loaded_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(model: ModelHandle, metadata: ModelMetadata) -> Self {
        Self { model, metadata, loaded_at: Utc::now() }
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("metadata", &self.metadata)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

/// Memo table of loaded models keyed by model name.
///
/// Entries are never evicted; loading the same name again overwrites the
/// previous entry.
pub struct ModelCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Clone out the entry for `name`, if present.
    pub fn get(&self, name: &str) -> Option<CacheEntry> {
        self.entries.lock().get(name).cloned()
    }

    /// Insert or replace the entry for `name`. Returns the replaced entry.
    pub fn insert(&self, name: &str, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.lock().insert(name.to_string(), entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    /// Names of all cached models, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}
