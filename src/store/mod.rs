//! Character persistence port
//!
//! The engine persists versioned [`Snapshot`]s through a [`CharacterStore`]:
//! - `MemoryStore`: in-process map (tests, ephemeral runs)
//! - `SqliteStore`: durable SQLite table

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::Character;

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt snapshot for {0}: data is not an object")]
    Corrupt(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A versioned, serialized character record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub character_id: String,
    pub version: u64,
    pub saved_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl Snapshot {
    /// Capture the current character record
    pub fn capture(character: &Character, version: u64) -> Result<Self, StoreError> {
        Ok(Self {
            character_id: character.id.clone(),
            version,
            saved_at: Utc::now(),
            data: serde_json::to_value(character)?,
        })
    }

    /// Shallow-merge the stored fields over `defaults`.
    ///
    /// Top-level keys present in the snapshot replace the default's keys
    /// wholesale; keys the snapshot lacks keep their default value. The
    /// result is normalized, so out-of-range pools are clamped and items
    /// without ids get one.
    pub fn restore(&self, defaults: &Character) -> Result<Character, StoreError> {
        let stored = self
            .data
            .as_object()
            .ok_or_else(|| StoreError::Corrupt(self.character_id.clone()))?;

        let mut merged = match serde_json::to_value(defaults)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(StoreError::Corrupt(self.character_id.clone())),
        };
        for (key, value) in stored {
            merged.insert(key.clone(), value.clone());
        }

        let mut character: Character = serde_json::from_value(serde_json::Value::Object(merged))?;
        character.normalize();
        Ok(character)
    }
}

/// Storage collaborator for character snapshots.
///
/// `save` must be durable before it returns. Repeated saves of the same
/// character are last-write-wins.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Load the latest snapshot for a character, if any
    async fn load(&self, character_id: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Persist a snapshot, replacing any earlier one
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}
