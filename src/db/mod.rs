//! Database connection and operations

pub mod files;
pub mod media_metadata;
pub mod schema;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::ExtractResult;

pub use files::{CandidateQuery, CandidateRef, FileRecord, FileRepository};
pub use media_metadata::{MediaMetadataRepository, MetadataRecord};

/// Relational operations an extraction run needs
///
/// Implemented by [`Database`] for PostgreSQL; tests substitute an in-memory store.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Files still lacking metadata, capped at `query.limit`
    async fn select_candidates(&self, query: &CandidateQuery) -> ExtractResult<Vec<CandidateRef>>;

    /// Bulk insert; an empty slice is a no-op
    async fn insert_metadata(&self, records: &[MetadataRecord]) -> ExtractResult<()>;

    /// Content hashes whose metadata no longer has a backing file
    async fn find_orphans(&self) -> ExtractResult<HashSet<String>>;

    /// Bulk delete by content hash; an empty set is a no-op
    async fn delete_metadata(&self, content_hashes: &HashSet<String>) -> ExtractResult<()>;
}

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the tables this job owns
    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await?;
        Ok(())
    }

    /// Get a files repository
    pub fn files(&self) -> FileRepository {
        FileRepository::new(self.pool.clone())
    }

    /// Get a media metadata repository
    pub fn media_metadata(&self) -> MediaMetadataRepository {
        MediaMetadataRepository::new(self.pool.clone())
    }
}

#[async_trait]
impl MetadataStore for Database {
    async fn select_candidates(&self, query: &CandidateQuery) -> ExtractResult<Vec<CandidateRef>> {
        Ok(self.files().select_candidates(query).await?)
    }

    async fn insert_metadata(&self, records: &[MetadataRecord]) -> ExtractResult<()> {
        self.media_metadata().insert_batch(records).await?;
        Ok(())
    }

    async fn find_orphans(&self) -> ExtractResult<HashSet<String>> {
        Ok(self.media_metadata().find_orphans().await?)
    }

    async fn delete_metadata(&self, content_hashes: &HashSet<String>) -> ExtractResult<()> {
        self.media_metadata()
            .delete_by_content_hashes(content_hashes)
            .await?;
        Ok(())
    }
}
