//! Video and image endpoints (upload, list, fetch, delete, thumbnail)

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AuthUser;
use crate::AppState;
use crate::constants::{IMAGE_FOLDER, VIDEO_FOLDER};
use crate::domain::videos::{self as videos_domain, NewVideo};
use crate::models::Video;
use crate::services::error::{ApiError, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/video-upload", post(upload_video))
        .route("/image-upload", post(upload_image))
        .route("/videos", get(list_videos).delete(delete_video))
        .route("/videos/{*public_id}", get(get_video))
        .route("/video-thumbnail", post(video_thumbnail))
}

/// Fields collected from the upload form
#[derive(Default)]
struct UploadForm {
    file: Option<Bytes>,
    title: Option<String>,
    description: Option<String>,
    original_size: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal("Multipart read error", e, "Invalid form data"))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                form.file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::internal("File read error", e, "Invalid form data"))?,
                )
            }
            "title" => form.title = field.text().await.ok(),
            "description" => form.description = field.text().await.ok(),
            "originalSize" => form.original_size = field.text().await.ok(),
            _ => {}
        }
    }
    Ok(form)
}

/// POST /video-upload - Upload a video to the CDN and record it
async fn upload_video(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Video>), ApiError> {
    let form = read_upload_form(multipart).await?;

    let file = form.file.ok_or_else(|| ApiError::bad_request("File not found"))?;
    let title = form
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    let description = form
        .description
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;
    let original_size: i64 = form
        .original_size
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))?;

    let upload = state
        .cdn
        .upload_video(file.to_vec(), VIDEO_FOLDER)
        .await
        .log_500("Upload video error", "Upload video failed")?;

    println!(
        "[upload] user {} video {} ({} -> {} bytes)",
        user_id, upload.public_id, original_size, upload.bytes
    );

    let video = videos_domain::create_video(
        &state.db,
        NewVideo {
            public_id: upload.public_id,
            title,
            description: Some(description),
            original_size,
            compressed_size: upload.bytes,
            duration_sec: upload.duration,
        },
    )
    .await
    .log_500("Create video error", "Upload video failed")?;

    Ok((StatusCode::CREATED, Json(video)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageUploadResponse {
    public_id: String,
    url: String,
}

/// POST /image-upload - Upload an image to the CDN
async fn upload_image(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let form = read_upload_form(multipart).await?;
    let file = form.file.ok_or_else(|| ApiError::bad_request("File not found"))?;

    let upload = state
        .cdn
        .upload_image(file.to_vec(), IMAGE_FOLDER)
        .await
        .log_500("Upload image error", "Upload image failed")?;

    println!(
        "[upload] user {} image {} ({} bytes)",
        user_id, upload.public_id, upload.bytes
    );

    Ok(Json(ImageUploadResponse {
        public_id: upload.public_id,
        url: upload.secure_url,
    }))
}

/// GET /videos - List all videos, newest first
async fn list_videos(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Video>>, ApiError> {
    let videos = videos_domain::list_videos(&state.db)
        .await
        .log_500("List videos error", "Error fetching videos")?;
    Ok(Json(videos))
}

/// GET /videos/{*public_id} - Fetch one video by its CDN public id.
/// Public ids contain folder prefixes, hence the wildcard segment.
async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Json<Video>, ApiError> {
    let video = videos_domain::get_video(&state.db, &public_id)
        .await
        .log_500("Get video error", "Error fetching video")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    Ok(Json(video))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteParams {
    public_id: Option<String>,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
}

/// DELETE /videos?publicId= - Delete from the CDN, then from the database
async fn delete_video(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<DeleteParams>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let public_id = params
        .public_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing publicId"))?;

    state
        .cdn
        .destroy(&public_id, "video")
        .await
        .log_500("CDN delete error", "Failed to delete video")?;

    let deleted = videos_domain::delete_video(&state.db, &public_id)
        .await
        .log_500("Delete video error", "Failed to delete video")?;
    if !deleted {
        return Err(ApiError::not_found("Video not found"));
    }

    println!("[delete] user {} removed video {}", user_id, public_id);

    Ok(Json(DeleteResponse {
        message: "Video deleted successfully".to_string(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThumbnailRequest {
    public_id: String,
    timestamp: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThumbnailResponse {
    thumbnail_url: String,
}

/// POST /video-thumbnail - Build a time-offset thumbnail delivery URL
async fn video_thumbnail(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ThumbnailRequest>,
) -> Result<Json<ThumbnailResponse>, ApiError> {
    if req.public_id.is_empty() || req.timestamp < 0.0 {
        return Err(ApiError::bad_request("Missing input"));
    }

    Ok(Json(ThumbnailResponse {
        thumbnail_url: state.cdn.thumbnail_url(&req.public_id, req.timestamp),
    }))
}
