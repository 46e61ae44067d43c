//! Thumbnail and image retrieval for inline transmission to the model.

use base64::Engine;
use reqwest::Client;

use crate::gemini::InlineImage;

/// Fetch an image over HTTP(S) and base64-encode it for an inline request
/// part. The declared content type defaults to `image/jpeg` when the response
/// omits it. Any transport error or non-success status aborts the caller's
/// pipeline; this step is never retried.
pub async fn fetch_inline_image(http: &Client, url: &str) -> Result<InlineImage, FetchError> {
    let resp = http.get(url).send().await?;

    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status().as_u16()));
    }

    let mime_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    let bytes = resp.bytes().await?;
    let data = base64::engine::general_purpose::STANDARD.encode(&bytes);

    Ok(InlineImage { mime_type, data })
}

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Http(e)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(e) => write!(f, "Image fetch error: {}", e),
            FetchError::Status(code) => write!(f, "Image fetch failed with status {}", code),
        }
    }
}

impl std::error::Error for FetchError {}
