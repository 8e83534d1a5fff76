//! # Seeding Utility
//!
//! Wipes and repopulates a store's collections (one per resource) from the
//! fixture dataset before a suite run. The verifier never seeds anything
//! itself; it relies on a seeder having run.
//!
//! Two stores are supported:
//!
//! - [`SqliteSeeder`]: a persistent SQLite database with one table per
//!   resource, each row holding the entity as a JSON document.
//! - [`InMemoryBackend`]: the in-process backend, reset through its actors.

use crate::backend::InMemoryBackend;
use crate::fixtures::FixtureStore;
use crate::model::{Entity, EntityId, ResourceName};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

/// Errors raised while seeding a store.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to encode {resource} record: {source}")]
    Encode {
        resource: ResourceName,
        source: serde_json::Error,
    },

    #[error("{0} record without id")]
    MissingId(ResourceName),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// A store that can be wiped and repopulated from the fixture dataset.
#[async_trait]
pub trait Seeder: Send + Sync {
    /// Replaces every collection's contents with the dataset. Returns the
    /// number of records inserted.
    async fn reset(&self, fixtures: &FixtureStore) -> Result<usize, SeedError>;
}

/// Seeds a SQLite database at `path`.
#[derive(Debug, Clone)]
pub struct SqliteSeeder {
    path: PathBuf,
}

impl SqliteSeeder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reset_blocking(path: &Path, records: Vec<(ResourceName, Vec<Entity>)>) -> Result<usize, SeedError> {
        let mut conn = Connection::open(path)?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        for (resource, entities) in records {
            let table = resource.as_str();
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY, doc TEXT NOT NULL);
                 DELETE FROM {table};"
            ))?;
            let mut insert = tx.prepare(&format!("INSERT INTO {table} (id, doc) VALUES (?1, ?2)"))?;
            for entity in &entities {
                let id = EntityId::of(entity).ok_or(SeedError::MissingId(resource))?;
                let doc = serde_json::to_string(entity)
                    .map_err(|source| SeedError::Encode { resource, source })?;
                insert.execute(params![id.as_str(), doc])?;
                inserted += 1;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}

#[async_trait]
impl Seeder for SqliteSeeder {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn reset(&self, fixtures: &FixtureStore) -> Result<usize, SeedError> {
        let path = self.path.clone();
        let records: Vec<_> = fixtures
            .dataset()
            .iter()
            .map(|(resource, entities)| (*resource, entities.clone()))
            .collect();

        let inserted = tokio::task::spawn_blocking(move || Self::reset_blocking(&path, records))
            .await
            .map_err(|e| SeedError::Backend(e.to_string()))??;

        info!(inserted, "Database seeded");
        Ok(inserted)
    }
}

#[async_trait]
impl Seeder for InMemoryBackend {
    async fn reset(&self, fixtures: &FixtureStore) -> Result<usize, SeedError> {
        let mut inserted = 0;
        for resource in ResourceName::ALL {
            let records = fixtures.records(resource).to_vec();
            let collection = self
                .collection(resource)
                .map_err(|e| SeedError::Backend(e.to_string()))?;
            inserted += collection
                .reset(records)
                .await
                .map_err(|e| SeedError::Backend(e.to_string()))?;
        }
        info!(inserted, "In-memory backend seeded");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ResourceApi;
    use tempfile::TempDir;

    const DATASET: &str = include_str!("../../fixtures/data.json");
    const CASES: &str = include_str!("../../fixtures/test_cases.json");

    fn fixtures() -> FixtureStore {
        FixtureStore::from_json(DATASET, CASES).unwrap()
    }

    #[tokio::test]
    async fn test_sqlite_seed_wipes_and_repopulates() {
        let dir = TempDir::new().expect("temp dir");
        let seeder = SqliteSeeder::new(dir.path().join("api.db"));
        let fixtures = fixtures();
        let total: usize = fixtures.dataset().values().map(Vec::len).sum();

        assert_eq!(seeder.reset(&fixtures).await.unwrap(), total);

        // Stray rows disappear on the next seed.
        {
            let conn = Connection::open(seeder.path()).unwrap();
            conn.execute(
                "INSERT INTO posts (id, doc) VALUES ('9999', '{}')",
                [],
            )
            .unwrap();
        }
        assert_eq!(seeder.reset(&fixtures).await.unwrap(), total);

        let conn = Connection::open(seeder.path()).unwrap();
        let posts: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(posts as usize, fixtures.records(ResourceName::Posts).len());

        let doc: String = conn
            .query_row("SELECT doc FROM users WHERE id = '1'", [], |row| row.get(0))
            .unwrap();
        let user: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(user["address"]["geo"], fixtures.records(ResourceName::Users)[0]["address"]["geo"]);
    }

    #[tokio::test]
    async fn test_in_memory_seed_restores_deleted_records() {
        let fixtures = fixtures();
        let backend = InMemoryBackend::start();
        backend.reset(&fixtures).await.unwrap();

        let first = EntityId::of(fixtures.first_of(ResourceName::Albums).unwrap()).unwrap();
        let deleted = backend.delete(ResourceName::Albums, &first).await.unwrap();
        assert_eq!(deleted.status, 200);

        backend.reset(&fixtures).await.unwrap();
        let read = backend.read(ResourceName::Albums, &first).await.unwrap();
        assert_eq!(read.status, 200);
    }
}
