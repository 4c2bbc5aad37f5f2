//! SQLite-backed snapshot store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{CharacterStore, Snapshot, StoreError};

/// Snapshot storage in the `characters` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All stored character ids
    pub async fn ids(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM characters ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl CharacterStore for SqliteStore {
    async fn load(&self, character_id: &str) -> Result<Option<Snapshot>, StoreError> {
        let row: Option<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT id, version, snapshot, saved_at
            FROM characters WHERE id = ?
            "#,
        )
        .bind(character_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SnapshotRow::into_snapshot).transpose()
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let data = serde_json::to_string(&snapshot.data)?;
        let saved_at = snapshot.saved_at.to_rfc3339();
        let updated_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO characters (id, version, snapshot, saved_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                version = excluded.version,
                snapshot = excluded.snapshot,
                saved_at = excluded.saved_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&snapshot.character_id)
        .bind(snapshot.version as i64)
        .bind(&data)
        .bind(&saved_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        debug!(
            "Saved snapshot v{} for {}",
            snapshot.version, snapshot.character_id
        );
        Ok(())
    }
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: String,
    version: i64,
    snapshot: String,
    saved_at: String,
}

impl SnapshotRow {
    fn into_snapshot(self) -> Result<Snapshot, StoreError> {
        let data: serde_json::Value = serde_json::from_str(&self.snapshot)?;
        let saved_at = DateTime::parse_from_rfc3339(&self.saved_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| StoreError::Corrupt(self.id.clone()))?;

        Ok(Snapshot {
            character_id: self.id,
            version: self.version.max(0) as u64,
            saved_at,
            data,
        })
    }
}
