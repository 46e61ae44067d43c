//! Media CDN client (Cloudinary-style upload/delivery API).
//!
//! The CDN owns transcoding and thumbnail extraction; this module only shapes
//! signed upload requests, builds delivery URLs, and issues deletions by
//! public id.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Client;
use reqwest::multipart::{Form, Part as FormPart};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};

const API_BASE: &str = "https://api.cdn-media.example.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cdn-media.example.com";

/// Characters escaped when a public id is embedded in a delivery URL path.
/// Public ids may legitimately contain `/` (folder prefixes), so slashes
/// pass through.
const PATH_SET: &AsciiSet = &CONTROLS.add(b' ').add(b'?').add(b'#').add(b'%');

#[derive(Clone)]
pub struct CdnClient {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base: String,
    delivery_base: String,
    http: Client,
}

/// Reply from a signed upload: the provider-assigned public id plus the
/// transformed asset's stats.
#[derive(Debug, Deserialize)]
pub struct UploadResult {
    pub public_id: String,
    pub secure_url: String,
    pub bytes: i64,
    pub duration: Option<f64>,
}

impl CdnClient {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str, http: Client) -> Self {
        let api_base =
            std::env::var("CDN_API_BASE").unwrap_or_else(|_| API_BASE.to_string());
        let delivery_base =
            std::env::var("CDN_DELIVERY_BASE").unwrap_or_else(|_| DELIVERY_BASE.to_string());
        Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            delivery_base: delivery_base.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Upload a video with an automatic-quality mp4 transformation.
    /// The CDN transcodes and reports the transformed size and duration.
    pub async fn upload_video(
        &self,
        data: Vec<u8>,
        folder: &str,
    ) -> Result<UploadResult, CdnError> {
        self.upload(data, "video", folder, "q_auto,f_mp4").await
    }

    /// Upload an image with automatic quality/format selection.
    pub async fn upload_image(
        &self,
        data: Vec<u8>,
        folder: &str,
    ) -> Result<UploadResult, CdnError> {
        self.upload(data, "image", folder, "q_auto:good,f_auto").await
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        resource_type: &str,
        folder: &str,
        transformation: &str,
    ) -> Result<UploadResult, CdnError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("folder".to_string(), folder.to_string()),
            ("timestamp".to_string(), timestamp.clone()),
            ("transformation".to_string(), transformation.to_string()),
        ];
        let signature = self.sign(&params);

        let url = format!("{}/{}/{}/upload", self.api_base, self.cloud_name, resource_type);

        let form = Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("transformation", transformation.to_string())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", FormPart::bytes(data).file_name("upload"));

        let resp = self.http.post(&url).multipart(form).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(CdnError::Api(text));
        }

        let result: UploadResult = resp.json().await?;
        Ok(result)
    }

    /// Delivery URL for a frame grabbed `offset_sec` into a stored video,
    /// filled to the standard thumbnail size.
    pub fn thumbnail_url(&self, public_id: &str, offset_sec: f64) -> String {
        format!(
            "{}/{}/video/upload/so_{},w_{},h_{},c_fill,g_auto/{}.jpg",
            self.delivery_base,
            self.cloud_name,
            offset_sec,
            THUMBNAIL_WIDTH,
            THUMBNAIL_HEIGHT,
            utf8_percent_encode(public_id, PATH_SET)
        )
    }

    /// Delete a stored asset by public id.
    pub async fn destroy(&self, public_id: &str, resource_type: &str) -> Result<(), CdnError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("public_id".to_string(), public_id.to_string()),
            ("timestamp".to_string(), timestamp.clone()),
        ];
        let signature = self.sign(&params);

        let url = format!(
            "{}/{}/{}/destroy",
            self.api_base, self.cloud_name, resource_type
        );

        let form = [
            ("api_key", self.api_key.as_str()),
            ("timestamp", &timestamp),
            ("public_id", public_id),
            ("signature", &signature),
            ("signature_algorithm", "sha256"),
        ];

        let resp = self.http.post(&url).form(&form).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(CdnError::Api(text));
        }

        Ok(())
    }

    /// SHA-256 hex digest of the sorted `key=value` pairs plus the API secret.
    fn sign(&self, params: &[(String, String)]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(string_to_sign(params).as_bytes());
        hasher.update(self.api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Canonical parameter string for signing: pairs sorted by key, joined as
/// `key=value` with `&`.
fn string_to_sign(params: &[(String, String)]) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort();
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug)]
pub enum CdnError {
    Http(reqwest::Error),
    Api(String),
}

impl From<reqwest::Error> for CdnError {
    fn from(e: reqwest::Error) -> Self {
        CdnError::Http(e)
    }
}

impl std::fmt::Display for CdnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CdnError::Http(e) => write!(f, "HTTP error: {}", e),
            CdnError::Api(s) => write!(f, "CDN API error: {}", s),
        }
    }
}

impl std::error::Error for CdnError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> CdnClient {
        CdnClient {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            api_base: API_BASE.to_string(),
            delivery_base: DELIVERY_BASE.to_string(),
            http: Client::new(),
        }
    }

    #[test]
    fn test_string_to_sign_sorts_params() {
        let params = [
            ("timestamp".to_string(), "123".to_string()),
            ("folder".to_string(), "video-uploads".to_string()),
        ];
        assert_eq!(string_to_sign(&params), "folder=video-uploads&timestamp=123");
    }

    #[test]
    fn test_signature_is_order_independent() {
        let client = test_client();
        let a = [
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ];
        let b = [
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        assert_eq!(client.sign(&a), client.sign(&b));
    }

    #[test]
    fn test_thumbnail_url_shape() {
        let client = test_client();
        let url = client.thumbnail_url("video-uploads/abc123", 4.5);
        assert_eq!(
            url,
            format!(
                "{}/demo/video/upload/so_4.5,w_1280,h_720,c_fill,g_auto/video-uploads/abc123.jpg",
                DELIVERY_BASE
            )
        );
    }
}
