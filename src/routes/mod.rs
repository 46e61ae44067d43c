pub mod captions;
pub mod videos;

use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::AppState;
use crate::services::error::ApiError;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(videos::routes())
        .merge(captions::routes())
}

// ============================================================================
// Auth extractor - verified user id from the identity provider
// ============================================================================

/// Extractor for the identity provider's verified user id.
///
/// The frontend proxy authenticates the session and forwards the user id in
/// `x-user-id`; a missing or empty header rejects the request before any
/// upload or delete work happens.
pub struct AuthUser(pub String);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| AuthUser(v.to_string()))
            .ok_or_else(ApiError::unauthorized)
    }
}
