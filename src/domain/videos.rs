//! Video domain - DB queries for stored media assets
//!
//! All functions use the generic Executor pattern, allowing them to work with
//! both `&PgPool` (for standalone queries) and `&mut PgConnection` (for
//! transactions).

use sqlx::{Executor, Postgres};

use crate::models::Video;

const VIDEO_COLUMNS: &str = "id, public_id, title, description, original_size, \
     compressed_size, duration_sec, caption, tone, tags, created_at, updated_at";

/// Fields for a freshly uploaded video, before any caption exists.
#[derive(Debug)]
pub struct NewVideo {
    pub public_id: String,
    pub title: String,
    pub description: Option<String>,
    pub original_size: i64,
    pub compressed_size: i64,
    pub duration_sec: Option<f64>,
}

/// All videos, newest first.
pub async fn list_videos<'e, E>(executor: E) -> Result<Vec<Video>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        SELECT {VIDEO_COLUMNS}
        FROM videos
        ORDER BY created_at DESC
        "#,
    ))
    .fetch_all(executor)
    .await
}

/// Look up one video by its CDN public id.
pub async fn get_video<'e, E>(executor: E, public_id: &str) -> Result<Option<Video>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        SELECT {VIDEO_COLUMNS}
        FROM videos
        WHERE public_id = $1
        "#,
    ))
    .bind(public_id)
    .fetch_optional(executor)
    .await
}

/// Insert a row for a successful upload and return it.
pub async fn create_video<'e, E>(executor: E, new: NewVideo) -> Result<Video, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        INSERT INTO videos (public_id, title, description, original_size,
                            compressed_size, duration_sec, tags, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, '{{}}', NOW(), NOW())
        RETURNING {VIDEO_COLUMNS}
        "#,
    ))
    .bind(&new.public_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.original_size)
    .bind(new.compressed_size)
    .bind(new.duration_sec)
    .fetch_one(executor)
    .await
}

/// Write caption, tone, and derived tags onto a video. Returns the updated
/// row, or None when the public id is unknown. Last write wins; there is no
/// version check on concurrent saves.
pub async fn save_caption<'e, E>(
    executor: E,
    public_id: &str,
    caption: &str,
    tone: Option<&str>,
    tags: &[String],
) -> Result<Option<Video>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(&format!(
        r#"
        UPDATE videos SET
            caption = $2,
            tone = $3,
            tags = $4,
            updated_at = NOW()
        WHERE public_id = $1
        RETURNING {VIDEO_COLUMNS}
        "#,
    ))
    .bind(public_id)
    .bind(caption)
    .bind(tone)
    .bind(tags)
    .fetch_optional(executor)
    .await
}

/// Delete a video row by public id. Returns false when nothing matched.
pub async fn delete_video<'e, E>(executor: E, public_id: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM videos WHERE public_id = $1")
        .bind(public_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
