//! Shared data models used across modules

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored media asset, keyed by the CDN-assigned public id.
///
/// `caption`, `tone`, and `tags` stay empty until the user saves a generated
/// caption for the first time.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub public_id: String,
    pub title: String,
    pub description: Option<String>,
    pub original_size: i64,
    pub compressed_size: i64,
    pub duration_sec: Option<f64>,
    pub caption: Option<String>,
    pub tone: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
