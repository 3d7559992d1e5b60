//! Read access to the shared `files` table
//!
//! The table is owned by the file store; this job only reads it. Column names follow
//! the store's schema (`contenthash`, `pathnamehash`, ...) and are aliased to the
//! crate's field names in every query.

use sqlx::PgPool;

use crate::services::mime_types::{MimeListFormat, MimeTypes, supported_mime_types};

/// File area holding not-yet-saved uploads
pub const DRAFT_FILEAREA: &str = "draft";

/// Filename the store uses for directory entries
pub const DIRECTORY_FILENAME: &str = ".";

/// A file that still needs metadata extracted
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CandidateRef {
    pub content_hash: String,
    pub path_hash: String,
    pub time_created: i64,
}

/// A row of the `files` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    pub content_hash: String,
    pub path_hash: String,
    pub mime_type: Option<String>,
    pub filename: String,
    pub time_created: i64,
}

/// Parameters for candidate selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuery {
    pub mime_types: Vec<String>,
    pub excluded_component: String,
    pub excluded_filearea: String,
    pub excluded_filename: String,
    pub limit: i64,
}

impl CandidateQuery {
    /// Supported media types, excluding drafts, directories, and `excluded_component`
    pub fn new(excluded_component: impl Into<String>, limit: i64) -> Self {
        let mime_types = match supported_mime_types(MimeListFormat::List) {
            MimeTypes::List(types) => types.into_iter().map(str::to_string).collect(),
            MimeTypes::Quoted(_) => Vec::new(),
        };

        Self {
            mime_types,
            excluded_component: excluded_component.into(),
            excluded_filearea: DRAFT_FILEAREA.to_string(),
            excluded_filename: DIRECTORY_FILENAME.to_string(),
            limit,
        }
    }
}

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Files of a supported type with no `media_metadata` row, at most `query.limit`
    ///
    /// Joins against the full file table, so the result is deliberately capped rather
    /// than streamed: a run never holds a cursor open while probing.
    pub async fn select_candidates(
        &self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateRef>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRef>(
            r#"
            SELECT f.contenthash AS content_hash,
                   f.pathnamehash AS path_hash,
                   f.timecreated AS time_created
            FROM files f
            LEFT JOIN media_metadata m ON f.contenthash = m.content_hash
            WHERE f.mimetype = ANY($1)
              AND m.content_hash IS NULL
              AND f.component <> $2
              AND f.filearea <> $3
              AND f.filename <> $4
            LIMIT $5
            "#,
        )
        .bind(&query.mime_types)
        .bind(&query.excluded_component)
        .bind(&query.excluded_filearea)
        .bind(&query.excluded_filename)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Look up a file by path hash
    pub async fn get_by_path_hash(&self, path_hash: &str) -> Result<Option<FileRecord>, sqlx::Error> {
        sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT contenthash AS content_hash,
                   pathnamehash AS path_hash,
                   mimetype AS mime_type,
                   filename,
                   timecreated AS time_created
            FROM files
            WHERE pathnamehash = $1
            "#,
        )
        .bind(path_hash)
        .fetch_optional(&self.pool)
        .await
    }
}
