//! In-process snapshot store

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CharacterStore, Snapshot, StoreError};

/// Snapshot store backed by a map. Writes can be switched to fail to
/// exercise the persistence-failure path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<String, Snapshot>>,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Latest stored snapshot without going through the async port
    pub fn get(&self, character_id: &str) -> Option<Snapshot> {
        self.snapshots.lock().get(character_id).cloned()
    }

    /// Seed a snapshot directly
    pub fn insert(&self, snapshot: Snapshot) {
        self.snapshots
            .lock()
            .insert(snapshot.character_id.clone(), snapshot);
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn load(&self, character_id: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.get(character_id))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store write disabled".into()));
        }
        self.insert(snapshot.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
