//! Media metadata repository

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

/// Rows per INSERT statement; 11 binds per row keeps each statement well under
/// PostgreSQL's 65535 bind-parameter limit.
const INSERT_CHUNK_ROWS: usize = 1000;

/// Extracted metadata for one distinct content hash
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub content_hash: String,
    pub path_hash: String,
    /// Seconds
    pub duration: f64,
    pub bitrate: i64,
    pub size: i64,
    pub video_streams: i32,
    pub audio_streams: i32,
    pub width: i32,
    pub height: i32,
    /// Full probe payload as JSON
    pub metadata: String,
    pub time_created: i64,
}

#[derive(Clone)]
pub struct MediaMetadataRepository {
    pool: PgPool,
}

impl MediaMetadataRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert all records in one transaction
    pub async fn insert_batch(&self, records: &[MetadataRecord]) -> Result<u64, sqlx::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO media_metadata (content_hash, path_hash, duration, bitrate, size, \
                 video_streams, audio_streams, width, height, metadata, time_created) ",
            );
            builder.push_values(chunk, |mut row, record| {
                row.push_bind(&record.content_hash)
                    .push_bind(&record.path_hash)
                    .push_bind(record.duration)
                    .push_bind(record.bitrate)
                    .push_bind(record.size)
                    .push_bind(record.video_streams)
                    .push_bind(record.audio_streams)
                    .push_bind(record.width)
                    .push_bind(record.height)
                    .push_bind(&record.metadata)
                    .push_bind(record.time_created);
            });

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "Inserted media metadata records");

        Ok(inserted)
    }

    /// Content hashes with a metadata row but no file referencing them
    pub async fn find_orphans(&self) -> Result<HashSet<String>, sqlx::Error> {
        let hashes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT m.content_hash
            FROM media_metadata m
            LEFT JOIN files f ON f.contenthash = m.content_hash
            WHERE f.contenthash IS NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(hashes.into_iter().collect())
    }

    /// Delete every row whose content hash is in the set
    pub async fn delete_by_content_hashes(
        &self,
        content_hashes: &HashSet<String>,
    ) -> Result<u64, sqlx::Error> {
        if content_hashes.is_empty() {
            return Ok(0);
        }

        let hashes: Vec<String> = content_hashes.iter().cloned().collect();
        let result = sqlx::query("DELETE FROM media_metadata WHERE content_hash = ANY($1)")
            .bind(hashes)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
