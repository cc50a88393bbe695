//! Per-name single-flight gate for cold loads.
//!
//! Concurrent loads of the same uncached model queue behind one permit so the
//! body is downloaded once; loads of different models never contend. The
//! cache lock is unrelated and is never held while waiting here.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type GateMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Hands out one load permit per model name at a time.
pub struct LoadGate {
    gates: GateMap,
}

impl LoadGate {
    pub fn new() -> Self {
        Self { gates: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Wait for the permit for `name`. Released when the permit is dropped.
    pub async fn acquire(&self, name: &str) -> LoadPermit {
        let gate = {
            let mut gates = self.gates.lock();
            gates
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = gate.clone().lock_owned().await;
        LoadPermit {
            name: name.to_string(),
            gate,
            gates: self.gates.clone(),
            _guard: guard,
        }
    }

    /// Names with a load in progress or queued.
    pub fn active(&self) -> usize {
        self.gates.lock().len()
    }
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII permit; removes the gate entry when no one else is waiting on it.
pub struct LoadPermit {
    name: String,
    gate: Arc<AsyncMutex<()>>,
    gates: GateMap,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for LoadPermit {
    fn drop(&mut self) {
        let mut gates = self.gates.lock();
        // map entry + this permit + the owned guard
        if Arc::strong_count(&self.gate) <= 3 {
            gates.remove(&self.name);
        }
    }
}
