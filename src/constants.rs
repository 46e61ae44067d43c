//! Application constants

/// CDN folder for uploaded videos
pub const VIDEO_FOLDER: &str = "video-uploads";

/// CDN folder for uploaded images
pub const IMAGE_FOLDER: &str = "image-uploads";

/// Maximum upload size (100 MB)
pub const MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Captions shorter than this (after trimming) are replaced by the fallback
pub const MIN_CAPTION_LEN: usize = 10;

/// Maximum hashtags returned by the caption pipeline
pub const MAX_HASHTAGS: usize = 10;

/// Maximum content tags persisted per video
pub const MAX_CONTENT_TAGS: usize = 5;

/// Generic hashtags stripped from model output (matched case-insensitively)
pub const BANNED_HASHTAGS: &[&str] = &["video", "shorts", "viral", "trending", "fun", "cool"];

/// Hashtags substituted when extraction and filtering leave nothing.
/// Overridable via FALLBACK_HASHTAGS (comma-separated).
pub const DEFAULT_FALLBACK_HASHTAGS: &[&str] = &["anime", "goku", "fight", "power", "action"];

/// Tone applied when a request omits or misspells one
pub const DEFAULT_TONE: &str = "fun";

/// Placeholder title used when deriving tags for an untitled video
pub const UNTITLED: &str = "Untitled";

/// Thumbnail dimensions requested from the CDN
pub const THUMBNAIL_WIDTH: u32 = 1280;
pub const THUMBNAIL_HEIGHT: u32 = 720;
