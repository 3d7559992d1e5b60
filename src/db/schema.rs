//! Schema bootstrap for the tables this job owns
//!
//! Only `media_metadata` is created here. The `files` table belongs to the file
//! store and must already exist.

use sqlx::PgPool;
use tracing::info;

const CREATE_MEDIA_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS media_metadata (
    id BIGSERIAL PRIMARY KEY,
    content_hash VARCHAR(40) NOT NULL,
    path_hash VARCHAR(40) NOT NULL,
    duration DOUBLE PRECISION NOT NULL DEFAULT 0,
    bitrate BIGINT NOT NULL DEFAULT 0,
    size BIGINT NOT NULL DEFAULT 0,
    video_streams INTEGER NOT NULL DEFAULT 0,
    audio_streams INTEGER NOT NULL DEFAULT 0,
    width INTEGER NOT NULL DEFAULT 0,
    height INTEGER NOT NULL DEFAULT 0,
    metadata TEXT NOT NULL DEFAULT '{}',
    time_created BIGINT NOT NULL DEFAULT 0
)
"#;

const CREATE_CONTENT_HASH_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS media_metadata_content_hash_idx \
     ON media_metadata (content_hash)";

/// Create `media_metadata` and its unique content-hash index if missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in [CREATE_MEDIA_METADATA, CREATE_CONTENT_HASH_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("media_metadata schema ready");
    Ok(())
}
