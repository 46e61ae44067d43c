//! Generative-text client.
//!
//! Thin wrapper over a hosted generateContent endpoint. The provider's
//! candidates/content/parts envelope never leaves this module: callers hand
//! over an ordered list of [`Part`]s and get back the first candidate's text,
//! trimmed. Exactly one network call per invocation; no retries.

use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct GeminiClient {
    endpoint: String,
    api_key: String,
    model: String,
    http: Client,
}

/// One element of a generation request, in provider order.
#[derive(Debug, Clone, Serialize)]
pub enum Part {
    #[serde(rename = "text")]
    Text(String),
    #[serde(rename = "inline_data")]
    InlineData(InlineImage),
}

/// Base64-encoded image bytes for inline transmission.
#[derive(Debug, Clone, Serialize)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

// Request/response envelope (provider schema, private to this module)

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: &'a [Part],
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(endpoint: &str, api_key: &str, model: &str, http: Client) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            http,
        }
    }

    /// Send one generation request and return the first candidate's text,
    /// concatenated across parts and trimmed. A well-formed reply with no
    /// candidates yields an empty string; callers own the fallback policy.
    pub async fn generate(&self, parts: &[Part]) -> Result<String, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );

        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts,
            }],
        };

        let resp = self.http.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(GeminiError::Api(text));
        }

        let data: GenerateResponse = resp.json().await?;
        let text = data
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

#[derive(Debug)]
pub enum GeminiError {
    Http(reqwest::Error),
    Api(String),
}

impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        GeminiError::Http(e)
    }
}

impl std::fmt::Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiError::Http(e) => write!(f, "HTTP error: {}", e),
            GeminiError::Api(s) => write!(f, "Generation API error: {}", s),
        }
    }
}

impl std::error::Error for GeminiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_wire_format() {
        let text = serde_json::to_value(Part::Text("hello".into())).unwrap();
        assert_eq!(text, serde_json::json!({ "text": "hello" }));

        let image = serde_json::to_value(Part::InlineData(InlineImage {
            mime_type: "image/png".into(),
            data: "QUJD".into(),
        }))
        .unwrap();
        assert_eq!(
            image,
            serde_json::json!({
                "inline_data": { "mime_type": "image/png", "data": "QUJD" }
            })
        );
    }

    #[test]
    fn test_request_envelope_shape() {
        let parts = [Part::Text("prompt".into())];
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: &parts,
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "prompt" }] }]
            })
        );
    }

    #[test]
    fn test_response_envelope_parsing() {
        let raw = r#"{
            "candidates": [
                { "content": { "parts": [{ "text": "Epic final form!" }, { "text": "extra" }] } }
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        assert_eq!(text, "Epic final form! extra");
    }

    #[test]
    fn test_empty_candidates_parse_to_empty_text() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
