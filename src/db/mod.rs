//! SQLite database for character snapshots

use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

/// Schema steps, applied in order. `PRAGMA user_version` records how many
/// have run.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS characters (
        id TEXT PRIMARY KEY,
        version INTEGER NOT NULL,
        snapshot TEXT NOT NULL,
        saved_at TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_characters_updated ON characters(updated_at)",
];

/// Connection pool with the character schema applied
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `path`, or a private
    /// in-memory database when `path` is `None`
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let options = match path {
            Some(p) => SqliteConnectOptions::from_str(&format!("sqlite:{}", p))?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            None => SqliteConnectOptions::from_str("sqlite::memory:")?,
        };

        // every in-memory connection is a separate database
        let max_connections = if path.is_some() { 10 } else { 1 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::new(None).await
    }

    async fn migrate(&self) -> Result<()> {
        let (applied,): (i64,) = sqlx::query_as("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;

        let pending = MIGRATIONS.iter().skip(applied.max(0) as usize);
        let mut version = applied;
        for statement in pending {
            sqlx::query(statement).execute(&self.pool).await?;
            version += 1;
            // PRAGMA takes no bind parameters
            sqlx::query(&format!("PRAGMA user_version = {}", version))
                .execute(&self.pool)
                .await?;
        }

        if version != applied {
            info!("Migrated character schema from v{} to v{}", applied, version);
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn schema_version(&self) -> Result<i64> {
        let (version,): (i64,) = sqlx::query_as("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
