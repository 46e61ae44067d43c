//! Caption, hashtag, and tag generation pipeline.
//!
//! Prompt construction, model-response parsing, and fallback policy for video
//! captions, image captions, hashtag sets, refinement passes, and persisted
//! content tags. Parsing and filtering are pure functions; each `generate_*`
//! entry point makes exactly one model call (plus at most one thumbnail
//! fetch) and never retries.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TONE, MAX_CONTENT_TAGS, MAX_HASHTAGS, MIN_CAPTION_LEN};
use crate::gemini::{GeminiClient, GeminiError, Part};
use crate::media::{self, FetchError};

/// Refinement instructions the UI offers. Anything else falls back to the
/// first entry.
pub const REFINEMENTS: &[&str] = &[
    "More Engaging",
    "Shorter",
    "More Descriptive",
    "SEO Optimized",
];

const IMAGE_CAPTION_PROMPT: &str = "\
You are an assistant that writes short, fun and catchy captions for social media posts.
Describe the image vividly in 1 sentence. Your tone should be energetic, visual, and social-media friendly.
Use references if the character is recognizable (e.g. Goku, Luffy, Pikachu), otherwise describe the scene.
Avoid generic phrases like \"here is\" or \"an image of\". Just write the caption directly.";

/// Runtime-configurable pieces of the pipeline: the ban-list applied to
/// extracted hashtags and the set substituted when nothing survives.
#[derive(Debug, Clone)]
pub struct CaptionConfig {
    pub banned_hashtags: Vec<String>,
    pub fallback_hashtags: Vec<String>,
}

impl CaptionConfig {
    /// Built-in defaults, with the fallback set overridable via the
    /// FALLBACK_HASHTAGS env var (comma-separated).
    pub fn from_env() -> Self {
        let fallback_hashtags = std::env::var("FALLBACK_HASHTAGS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|tags| !tags.is_empty())
            .unwrap_or_else(|| {
                crate::constants::DEFAULT_FALLBACK_HASHTAGS
                    .iter()
                    .map(|t| t.to_string())
                    .collect()
            });

        Self {
            banned_hashtags: crate::constants::BANNED_HASHTAGS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            fallback_hashtags,
        }
    }
}

/// Parameters for one video caption run. Ephemeral; never persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    pub title: String,
    pub duration_sec: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl CaptionRequest {
    /// Rejects bad input before any outbound call is attempted.
    pub fn validate(&self) -> Result<(), CaptionError> {
        if self.title.trim().is_empty() || self.duration_sec <= 0.0 {
            return Err(CaptionError::InvalidInput("Missing title or duration"));
        }
        Ok(())
    }
}

/// Outcome of a caption run. The caption is never empty: below-threshold
/// model output is replaced by a deterministic fallback, and an empty
/// hashtag set is replaced by the configured default set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionResult {
    pub caption: String,
    pub hashtags: Vec<String>,
}

// Pure building blocks

/// Human-readable duration: "45 sec", "1 min 30 sec", "10 min 0 sec".
pub fn format_duration(secs: u64) -> String {
    if secs >= 60 {
        format!("{} min {} sec", secs / 60, secs % 60)
    } else {
        format!("{} sec", secs)
    }
}

/// Style instruction for a tone key. Unknown keys get the "fun" voice.
pub fn tone_instruction(tone: &str) -> &'static str {
    match tone {
        "formal" => {
            "Use a polished, professional tone suitable for business or formal brand use."
        }
        "chill" => {
            "Use a smooth, casual, conversational tone, like talking to a friend."
        }
        "descriptive" => {
            "Describe what's visually happening in the video, motion, expressions, \
             transformation, in a vivid narrative tone."
        }
        _ => {
            "Use a bold, energetic, and emoji-rich tone that would go viral on TikTok \
             or Instagram Reels."
        }
    }
}

fn refinement_instruction(refinement: &str) -> &str {
    if REFINEMENTS.contains(&refinement) {
        refinement
    } else {
        REFINEMENTS[0]
    }
}

/// Instruction string for a video caption run: role framing, the video's
/// metadata, the tone voice, the hashtag ban-list, and the strict two-line
/// output contract.
pub fn build_caption_prompt(req: &CaptionRequest, banned: &[String]) -> String {
    let duration_text = format_duration(req.duration_sec as u64);
    let description = req
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("N/A");
    let tone = tone_instruction(req.tone.as_deref().unwrap_or(DEFAULT_TONE));
    let ban_list = banned
        .iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You're a captioning assistant for viral short-form videos.\n\
         \n\
         Video Title: \"{title}\"\n\
         Duration: {duration_text}\n\
         Description: \"{description}\"\n\
         \n\
         Goal:\n\
         1. Write a short, catchy caption that fits the tone below.\n\
         2. Then, on a new line, write 3-5 relevant hashtags that reflect the \
         content, characters, themes, or action in the video.\n\
         \n\
         Tone: {tone}\n\
         \n\
         Do NOT use generic hashtags like {ban_list}.\n\
         Focus on specific elements: e.g., #Goku, #SuperSaiyan, #EpicBattle, #AnimeEdit\n\
         \n\
         Format strictly like this:\n\
         \n\
         <caption text>\n\
         #tag1, #tag2, #tag3, ...",
        title = req.title,
    )
}

fn build_hashtag_prompt(caption: &str) -> String {
    format!(
        "Generate 5 to 7 fun and relevant hashtags for this caption: \"{}\"\n\
         Make sure they match the theme (anime, energy, mood, etc.). \
         Return only hashtags, comma-separated.",
        caption
    )
}

fn build_refine_prompt(caption: &str, refinement: &str) -> String {
    format!(
        "You are a social media caption expert.\n\
         Refine the following caption to be \"{}\".\n\
         Only return the refined caption as a single compelling sentence.\n\
         Do NOT include any hashtags, emojis, or commentary. Just the plain sentence.\n\
         \n\
         Original:\n\
         \"{}\"\n\
         \n\
         Refined Caption:",
        refinement, caption
    )
}

fn build_tag_prompt(title: &str, caption: Option<&str>) -> String {
    format!(
        "You are an assistant that helps categorize short-form video content.\n\
         Extract 5-8 relevant tags (not hashtags) based on this title and caption.\n\
         Avoid emojis or punctuation. Just lowercase tags, comma-separated.\n\
         \n\
         Title: {}\n\
         Caption: {}",
        title,
        caption.filter(|c| !c.is_empty()).unwrap_or("N/A")
    )
}

/// Deterministic caption used when the model output is missing or shorter
/// than the minimum length.
pub fn fallback_caption(title: &str, duration_secs: u64) -> String {
    format!(
        "Watch \"{}\" — a quick {} video you'll love!",
        title,
        format_duration(duration_secs)
    )
}

/// Extract hashtag tokens from a line of model output.
///
/// A token is an optional leading `#` followed by one or more ASCII
/// alphanumeric or underscore characters; every other character separates
/// tokens. Leading hashes are dropped with the separators, so `#Goku,` and
/// `Goku` extract identically. ASCII-only on purpose: the model is told to
/// emit plain hashtags, and locale-dependent word boundaries are not worth
/// the surprises.
pub fn extract_tags(line: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut current = String::new();
    for ch in line.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            current.push(ch);
        } else if !current.is_empty() {
            tags.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tags.push(current);
    }
    tags
}

/// Drop ban-listed tags (case-insensitive), dedupe (case-insensitive, first
/// spelling wins), and cap the result.
pub fn filter_hashtags(tags: Vec<String>, banned: &[String], max: usize) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for tag in tags {
        let lower = tag.to_lowercase();
        if banned.iter().any(|b| b.eq_ignore_ascii_case(&lower)) || seen.contains(&lower) {
            continue;
        }
        seen.push(lower);
        out.push(tag);
        if out.len() == max {
            break;
        }
    }
    out
}

/// Split a model response into caption and hashtags, applying the fallback
/// policy. Everything before the first newline is the caption; the next line
/// is the tag line; further lines are ignored.
pub fn parse_caption_response(
    raw: &str,
    title: &str,
    duration_secs: u64,
    cfg: &CaptionConfig,
) -> CaptionResult {
    let mut lines = raw.split('\n');
    let caption_line = lines.next().unwrap_or("").trim();
    let tag_line = lines.next().unwrap_or("");

    let caption = if caption_line.chars().count() >= MIN_CAPTION_LEN {
        caption_line.to_string()
    } else {
        fallback_caption(title, duration_secs)
    };

    let mut hashtags = filter_hashtags(extract_tags(tag_line), &cfg.banned_hashtags, MAX_HASHTAGS);
    if hashtags.is_empty() {
        hashtags = cfg.fallback_hashtags.clone();
    }

    CaptionResult { caption, hashtags }
}

/// Clean a hashtags-only response (image posts, no caption line): same
/// extract/filter/fallback logic applied to the whole reply.
pub fn parse_hashtag_response(raw: &str, cfg: &CaptionConfig) -> Vec<String> {
    let hashtags = filter_hashtags(extract_tags(raw), &cfg.banned_hashtags, MAX_HASHTAGS);
    if hashtags.is_empty() {
        cfg.fallback_hashtags.clone()
    } else {
        hashtags
    }
}

/// Clean a content-tag response: comma-separated, lowercased, capped at
/// five. No ban-list on this path.
pub fn parse_content_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .take(MAX_CONTENT_TAGS)
        .collect()
}

// Orchestration: one model call per entry point, stages strictly sequential.

/// Full video-caption pipeline: validate, optionally inline the thumbnail,
/// call the model once, parse with fallbacks.
pub async fn generate_video_caption(
    gemini: &GeminiClient,
    http: &Client,
    cfg: &CaptionConfig,
    req: &CaptionRequest,
) -> Result<CaptionResult, CaptionError> {
    req.validate()?;

    let mut parts = vec![Part::Text(build_caption_prompt(req, &cfg.banned_hashtags))];
    if let Some(url) = req.thumbnail_url.as_deref().filter(|u| !u.is_empty()) {
        let image = media::fetch_inline_image(http, url).await?;
        parts.push(Part::InlineData(image));
    }

    let raw = gemini.generate(&parts).await?;
    println!("[caption] model response: {}", raw);

    Ok(parse_caption_response(
        &raw,
        &req.title,
        req.duration_sec as u64,
        cfg,
    ))
}

/// One-sentence caption for a standalone image post.
pub async fn generate_image_caption(
    gemini: &GeminiClient,
    http: &Client,
    image_url: &str,
) -> Result<String, CaptionError> {
    if image_url.is_empty() {
        return Err(CaptionError::InvalidInput("Missing image URL"));
    }

    let image = media::fetch_inline_image(http, image_url).await?;
    let parts = [
        Part::Text(IMAGE_CAPTION_PROMPT.to_string()),
        Part::InlineData(image),
    ];

    let raw = gemini.generate(&parts).await?;
    println!("[caption] image caption response: {}", raw);

    if raw.is_empty() {
        Ok("No caption generated".to_string())
    } else {
        Ok(raw)
    }
}

/// Hashtags for an existing caption (image posts without a duration).
pub async fn generate_hashtags(
    gemini: &GeminiClient,
    cfg: &CaptionConfig,
    caption: &str,
) -> Result<Vec<String>, CaptionError> {
    if caption.is_empty() {
        return Err(CaptionError::InvalidInput("Missing caption"));
    }

    let parts = [Part::Text(build_hashtag_prompt(caption))];
    let raw = gemini.generate(&parts).await?;
    println!("[caption] hashtag response: {}", raw);

    Ok(parse_hashtag_response(&raw, cfg))
}

/// Rewrite an existing caption per a refinement instruction. Unlike caption
/// generation there is no silent fallback here: an empty model reply is an
/// explicit `NoRefinement` error, because silently replacing text the user is
/// editing would be worse than reporting failure.
pub async fn refine_caption(
    gemini: &GeminiClient,
    caption: &str,
    refinement: &str,
) -> Result<String, CaptionError> {
    if caption.is_empty() {
        return Err(CaptionError::InvalidInput("Missing caption to refine"));
    }

    let instruction = refinement_instruction(refinement);
    let parts = [Part::Text(build_refine_prompt(caption, instruction))];
    let raw = gemini.generate(&parts).await?;
    println!("[caption] refine ({}) response: {}", instruction, raw);

    if raw.is_empty() {
        return Err(CaptionError::NoRefinement);
    }
    Ok(raw)
}

/// Lowercase content tags for categorization (persisted with the video,
/// distinct from display hashtags).
pub async fn generate_content_tags(
    gemini: &GeminiClient,
    title: &str,
    caption: Option<&str>,
) -> Result<Vec<String>, CaptionError> {
    if title.is_empty() {
        return Err(CaptionError::InvalidInput("Missing title"));
    }

    let parts = [Part::Text(build_tag_prompt(title, caption))];
    let raw = gemini.generate(&parts).await?;
    println!("[caption] tag response: {}", raw);

    Ok(parse_content_tags(&raw))
}

#[derive(Debug)]
pub enum CaptionError {
    InvalidInput(&'static str),
    Fetch(FetchError),
    Generation(GeminiError),
    NoRefinement,
}

impl From<FetchError> for CaptionError {
    fn from(e: FetchError) -> Self {
        CaptionError::Fetch(e)
    }
}

impl From<GeminiError> for CaptionError {
    fn from(e: GeminiError) -> Self {
        CaptionError::Generation(e)
    }
}

impl std::fmt::Display for CaptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptionError::InvalidInput(msg) => write!(f, "{}", msg),
            CaptionError::Fetch(e) => write!(f, "Thumbnail fetch failed: {}", e),
            CaptionError::Generation(e) => write!(f, "Generation failed: {}", e),
            CaptionError::NoRefinement => write!(f, "No meaningful refinement produced"),
        }
    }
}

impl std::error::Error for CaptionError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CaptionConfig {
        CaptionConfig {
            banned_hashtags: crate::constants::BANNED_HASHTAGS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            fallback_hashtags: crate::constants::DEFAULT_FALLBACK_HASHTAGS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45 sec");
        assert_eq!(format_duration(90), "1 min 30 sec");
        assert_eq!(format_duration(600), "10 min 0 sec");
    }

    #[test]
    fn test_tone_instruction_falls_back_to_fun() {
        assert_eq!(tone_instruction("mysterious"), tone_instruction("fun"));
        assert_ne!(tone_instruction("formal"), tone_instruction("fun"));
        assert_ne!(tone_instruction("chill"), tone_instruction("descriptive"));
    }

    #[test]
    fn test_caption_prompt_content() {
        let req = CaptionRequest {
            title: "Goku vs Frieza".into(),
            duration_sec: 95.0,
            description: None,
            tone: Some("fun".into()),
            thumbnail_url: None,
        };
        let prompt = build_caption_prompt(&req, &test_config().banned_hashtags);
        assert!(prompt.contains("1 min 35 sec"));
        assert!(prompt.contains("\"Goku vs Frieza\""));
        assert!(prompt.contains("Description: \"N/A\""));
        assert!(prompt.contains("#shorts"));
        assert!(prompt.contains(tone_instruction("fun")));
    }

    #[test]
    fn test_unknown_tone_prompts_like_fun() {
        let mut req = CaptionRequest {
            title: "Clip".into(),
            duration_sec: 30.0,
            description: Some("desc".into()),
            tone: Some("sinister".into()),
            thumbnail_url: None,
        };
        let unknown = build_caption_prompt(&req, &test_config().banned_hashtags);
        req.tone = Some("fun".into());
        let fun = build_caption_prompt(&req, &test_config().banned_hashtags);
        assert_eq!(unknown, fun);
    }

    #[test]
    fn test_extract_tags_strips_hashes_and_separators() {
        assert_eq!(
            extract_tags("#Goku, #SuperSaiyan, #fun"),
            vec!["Goku", "SuperSaiyan", "fun"]
        );
        assert_eq!(extract_tags("plain words here"), vec!["plain", "words", "here"]);
        assert_eq!(extract_tags("  #  , , "), Vec::<String>::new());
        assert_eq!(extract_tags("#snake_case_9"), vec!["snake_case_9"]);
    }

    #[test]
    fn test_filter_hashtags_is_case_insensitive() {
        let cfg = test_config();
        let tags = vec!["Goku".to_string(), "VIRAL".to_string(), "Fun".to_string()];
        assert_eq!(
            filter_hashtags(tags, &cfg.banned_hashtags, MAX_HASHTAGS),
            vec!["Goku"]
        );
    }

    #[test]
    fn test_filter_hashtags_dedupes_and_caps() {
        let cfg = test_config();
        let tags = vec![
            "Goku".to_string(),
            "goku".to_string(),
            "Vegeta".to_string(),
            "Frieza".to_string(),
        ];
        assert_eq!(
            filter_hashtags(tags, &cfg.banned_hashtags, 2),
            vec!["Goku", "Vegeta"]
        );
    }

    #[test]
    fn test_parse_caption_keeps_long_captions_verbatim() {
        let cfg = test_config();
        let result =
            parse_caption_response("Epic final form!\n#Goku, #SuperSaiyan, #fun", "Goku vs Frieza", 95, &cfg);
        assert_eq!(result.caption, "Epic final form!");
        assert_eq!(result.hashtags, vec!["Goku", "SuperSaiyan"]);
    }

    #[test]
    fn test_parse_caption_short_output_uses_fallback() {
        let cfg = test_config();
        let result = parse_caption_response("meh\n#Goku", "Goku vs Frieza", 95, &cfg);
        assert_eq!(
            result.caption,
            "Watch \"Goku vs Frieza\" — a quick 1 min 35 sec video you'll love!"
        );
        assert_eq!(result.hashtags, vec!["Goku"]);
    }

    #[test]
    fn test_parse_caption_empty_output_uses_both_fallbacks() {
        let cfg = test_config();
        let result = parse_caption_response("", "Clip", 45, &cfg);
        assert_eq!(result.caption, "Watch \"Clip\" — a quick 45 sec video you'll love!");
        assert_eq!(result.hashtags, cfg.fallback_hashtags);
    }

    #[test]
    fn test_parse_caption_all_tags_banned_uses_fallback_set() {
        let cfg = test_config();
        let result =
            parse_caption_response("A perfectly fine caption\n#viral, #trending", "Clip", 45, &cfg);
        assert_eq!(result.caption, "A perfectly fine caption");
        assert_eq!(result.hashtags, cfg.fallback_hashtags);
    }

    #[test]
    fn test_parse_caption_ignores_extra_lines() {
        let cfg = test_config();
        let result = parse_caption_response(
            "A perfectly fine caption\n#Goku\nsome trailing commentary",
            "Clip",
            45,
            &cfg,
        );
        assert_eq!(result.hashtags, vec!["Goku"]);
    }

    #[test]
    fn test_parse_hashtag_response() {
        let cfg = test_config();
        assert_eq!(
            parse_hashtag_response("#AnimeEdit, #Goku, #viral", &cfg),
            vec!["AnimeEdit", "Goku"]
        );
        assert_eq!(parse_hashtag_response("", &cfg), cfg.fallback_hashtags);
    }

    #[test]
    fn test_parse_content_tags_lowercases_and_caps_at_five() {
        assert_eq!(
            parse_content_tags("Anime, GOKU, fight , power, action, extra, more"),
            vec!["anime", "goku", "fight", "power", "action"]
        );
        assert_eq!(parse_content_tags(" , ,"), Vec::<String>::new());
    }

    #[test]
    fn test_validate_rejects_before_any_network_call() {
        // Validation is pure and runs before a client or request is built,
        // so a failing request provably makes zero outbound calls.
        let req = CaptionRequest {
            title: "   ".into(),
            duration_sec: 95.0,
            description: None,
            tone: None,
            thumbnail_url: None,
        };
        assert!(matches!(
            req.validate(),
            Err(CaptionError::InvalidInput(_))
        ));

        let req = CaptionRequest {
            title: "Clip".into(),
            duration_sec: 0.0,
            description: None,
            tone: None,
            thumbnail_url: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_refinement_instruction_fallback() {
        assert_eq!(refinement_instruction("Shorter"), "Shorter");
        assert_eq!(refinement_instruction("Make it rhyme"), "More Engaging");
    }

    #[test]
    fn test_refine_prompt_contains_instruction_and_original() {
        let prompt = build_refine_prompt("Epic final form!", "SEO Optimized");
        assert!(prompt.contains("\"SEO Optimized\""));
        assert!(prompt.contains("\"Epic final form!\""));
        assert!(prompt.contains("Do NOT include any hashtags"));
    }

    #[test]
    fn test_tag_prompt_uses_placeholder_for_missing_caption() {
        let prompt = build_tag_prompt("Goku vs Frieza", None);
        assert!(prompt.contains("Caption: N/A"));
        let prompt = build_tag_prompt("Goku vs Frieza", Some(""));
        assert!(prompt.contains("Caption: N/A"));
        let prompt = build_tag_prompt("Goku vs Frieza", Some("Epic"));
        assert!(prompt.contains("Caption: Epic"));
    }
}
