//! Content-addressed file store access
//!
//! Blobs live under `{root}/{h[0..2]}/{h[2..4]}/{h}` where `h` is the SHA-1 content
//! hash. The `files` table maps each path hash to its content hash.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::db::{FileRecord, FileRepository};
use crate::error::{ExtractError, ExtractResult};

/// A file resolved from the store, ready to be probed
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub content_hash: String,
    pub path_hash: String,
    pub filename: String,
    pub mime_type: Option<String>,
    /// Location of the blob on disk
    pub path: PathBuf,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Resolve a path hash to its stored file
    ///
    /// A missing record or blob is a [`ExtractError::Resolution`]: every path hash
    /// handed to the store came out of the file table, so absence means the table
    /// and the blob directory disagree.
    async fn get_by_path_hash(&self, path_hash: &str) -> ExtractResult<StoredFile>;
}

/// File store backed by the `files` table and a local blob directory
pub struct LocalFileStore {
    root: PathBuf,
    files: FileRepository,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, files: FileRepository) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn get_by_path_hash(&self, path_hash: &str) -> ExtractResult<StoredFile> {
        let record = self
            .files
            .get_by_path_hash(path_hash)
            .await?
            .ok_or_else(|| ExtractError::resolution(path_hash, "no file record"))?;

        resolve_blob(&self.root, record).await
    }
}

/// Blob location for a content hash
pub fn content_path(root: &Path, content_hash: &str) -> Option<PathBuf> {
    if content_hash.len() < 4 || !content_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(
        root.join(&content_hash[0..2])
            .join(&content_hash[2..4])
            .join(content_hash),
    )
}

async fn resolve_blob(root: &Path, record: FileRecord) -> ExtractResult<StoredFile> {
    let path = content_path(root, &record.content_hash).ok_or_else(|| {
        ExtractError::resolution(
            &record.path_hash,
            format!("malformed content hash {}", record.content_hash),
        )
    })?;

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ExtractError::resolution(
            &record.path_hash,
            format!("blob missing at {}", path.display()),
        ));
    }

    debug!(path_hash = %record.path_hash, path = %path.display(), "Resolved stored file");

    Ok(StoredFile {
        content_hash: record.content_hash,
        path_hash: record.path_hash,
        filename: record.filename,
        mime_type: record.mime_type,
        path,
    })
}
