//! Caption generation, refinement, and persistence endpoints
//!
//! Each handler drives one pipeline invocation: stages run strictly in
//! sequence, nothing is retried, and every failure maps to a stable
//! `{error}` response so the client keeps its unsaved state.

use axum::{
    Json, Router,
    extract::State,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::captions::{self, CaptionError, CaptionRequest, CaptionResult};
use crate::constants::UNTITLED;
use crate::domain::videos as videos_domain;
use crate::models::Video;
use crate::services::error::{ApiError, LogErr};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/video-caption", post(video_caption))
        .route("/generate-caption", post(generate_caption))
        .route("/generate-hashtags", post(generate_hashtags))
        .route("/refine-caption", post(refine_caption))
        .route("/generate-tags", post(generate_tags))
        .route("/save-video-caption", post(save_caption))
}

/// Map a pipeline failure onto the route surface: validation errors are the
/// client's fault, an empty refinement is reported distinctly, and everything
/// else collapses to a generic 500 with the detail logged server-side.
fn caption_error(context: &str, err: CaptionError, message: &str) -> ApiError {
    match err {
        CaptionError::InvalidInput(msg) => ApiError::bad_request(msg),
        CaptionError::NoRefinement => {
            ApiError::unprocessable("No meaningful refinement produced")
        }
        other => ApiError::internal(context, other, message),
    }
}

/// POST /video-caption - Full caption pipeline for an uploaded video
async fn video_caption(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CaptionRequest>,
) -> Result<Json<CaptionResult>, ApiError> {
    let result =
        captions::generate_video_caption(&state.gemini, &state.http, &state.captions, &req)
            .await
            .map_err(|e| {
                caption_error("Video caption error", e, "Video caption generation failed")
            })?;
    Ok(Json(result))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageCaptionRequest {
    #[serde(default)]
    image_url: String,
}

#[derive(Serialize)]
struct ImageCaptionResponse {
    caption: String,
}

/// POST /generate-caption - One-sentence caption for an image post
async fn generate_caption(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImageCaptionRequest>,
) -> Result<Json<ImageCaptionResponse>, ApiError> {
    let caption = captions::generate_image_caption(&state.gemini, &state.http, &req.image_url)
        .await
        .map_err(|e| caption_error("Image caption error", e, "Caption generation failed"))?;
    Ok(Json(ImageCaptionResponse { caption }))
}

#[derive(Deserialize)]
struct HashtagRequest {
    #[serde(default)]
    caption: String,
}

#[derive(Serialize)]
struct HashtagResponse {
    hashtags: Vec<String>,
}

/// POST /generate-hashtags - Hashtags for an existing caption
async fn generate_hashtags(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HashtagRequest>,
) -> Result<Json<HashtagResponse>, ApiError> {
    let hashtags = captions::generate_hashtags(&state.gemini, &state.captions, &req.caption)
        .await
        .map_err(|e| caption_error("Hashtag error", e, "Hashtag generation failed"))?;
    Ok(Json(HashtagResponse { hashtags }))
}

#[derive(Deserialize)]
struct RefineRequest {
    #[serde(default)]
    caption: String,
    #[serde(default)]
    refinement: Option<String>,
}

#[derive(Serialize)]
struct RefineResponse {
    refined: String,
}

/// POST /refine-caption - Rewrite an existing caption
async fn refine_caption(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefineRequest>,
) -> Result<Json<RefineResponse>, ApiError> {
    let refinement = req.refinement.as_deref().unwrap_or(captions::REFINEMENTS[0]);
    let refined = captions::refine_caption(&state.gemini, &req.caption, refinement)
        .await
        .map_err(|e| caption_error("Refine caption error", e, "Failed to refine caption"))?;
    Ok(Json(RefineResponse { refined }))
}

#[derive(Deserialize)]
struct TagRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    caption: Option<String>,
}

#[derive(Serialize)]
struct TagResponse {
    tags: Vec<String>,
}

/// POST /generate-tags - Lowercase content tags for categorization
async fn generate_tags(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TagRequest>,
) -> Result<Json<TagResponse>, ApiError> {
    let tags =
        captions::generate_content_tags(&state.gemini, &req.title, req.caption.as_deref())
            .await
            .map_err(|e| caption_error("Tag generation error", e, "Tag generation failed"))?;
    Ok(Json(TagResponse { tags }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveCaptionRequest {
    #[serde(default)]
    public_id: String,
    #[serde(default)]
    caption: String,
    #[serde(default)]
    tone: Option<String>,
}

#[derive(Serialize)]
struct SaveCaptionResponse {
    success: bool,
    video: Video,
}

/// POST /save-video-caption - Persist caption, tone, and derived tags.
///
/// The only durable step in the pipeline: until this returns success the
/// caption exists solely in the client. Tags are derived in-process; a tag
/// derivation failure degrades to an empty tag list rather than losing the
/// caption save.
async fn save_caption(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveCaptionRequest>,
) -> Result<Json<SaveCaptionResponse>, ApiError> {
    if req.public_id.is_empty() || req.caption.is_empty() {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    let video = videos_domain::get_video(&state.db, &req.public_id)
        .await
        .log_500("Get video error", "Failed to save caption")?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let title = if video.title.is_empty() {
        UNTITLED
    } else {
        &video.title
    };

    let tags = match captions::generate_content_tags(&state.gemini, title, Some(&req.caption))
        .await
    {
        Ok(tags) => tags,
        Err(e) => {
            eprintln!("[caption] tag derivation failed, saving without tags: {}", e);
            Vec::new()
        }
    };

    let updated = videos_domain::save_caption(
        &state.db,
        &req.public_id,
        &req.caption,
        req.tone.as_deref(),
        &tags,
    )
    .await
    .log_500("Save caption error", "Failed to save caption")?
    .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(Json(SaveCaptionResponse {
        success: true,
        video: updated,
    }))
}
