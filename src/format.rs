//! Format selection for the external fetch tool
//!
//! Maps the user-facing format choice to a yt-dlp format-selection expression.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// yt-dlp expression for audio-only downloads
pub const AUDIO_ONLY_EXPRESSION: &str = "bestaudio[ext=m4a]/bestaudio";

/// yt-dlp expression for mp4 video capped at 720p
pub const VIDEO_CAPPED_EXPRESSION: &str =
    "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]/best";

/// User-facing format selector
///
/// Deserialization is lenient: any unrecognized value (`null`, numbers,
/// objects, unknown tokens) becomes [`FormatSelector::VideoCapped`] instead of
/// failing the request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormatSelector {
    /// Best m4a audio stream (user tokens: `m4a`, `audio`)
    AudioOnly,
    /// Best mp4 video up to 720p merged with m4a audio (user tokens: `mp4`, `video`)
    #[default]
    VideoCapped,
}

impl FormatSelector {
    /// Parse a user-supplied token, falling back to the default for anything unknown
    pub fn from_user_input(input: Option<&str>) -> Self {
        let Some(token) = input else {
            return Self::default();
        };

        match token.trim().to_ascii_lowercase().as_str() {
            "m4a" | "audio" | "audio_only" => FormatSelector::AudioOnly,
            "mp4" | "video" | "video_capped" => FormatSelector::VideoCapped,
            other => {
                tracing::debug!(format = other, "unrecognized format selector, using default");
                Self::default()
            }
        }
    }

    /// Resolve to the expression passed verbatim to the fetch tool via `-f`
    pub fn expression(&self) -> &'static str {
        match self {
            FormatSelector::AudioOnly => AUDIO_ONLY_EXPRESSION,
            FormatSelector::VideoCapped => VIDEO_CAPPED_EXPRESSION,
        }
    }
}

impl From<&str> for FormatSelector {
    fn from(value: &str) -> Self {
        Self::from_user_input(Some(value))
    }
}

impl<'de> Deserialize<'de> for FormatSelector {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(token) => Ok(Self::from_user_input(Some(&token))),
            serde_json::Value::Null => Ok(Self::default()),
            other => {
                tracing::debug!(format = %other, "non-string format selector, using default");
                Ok(Self::default())
            }
        }
    }
}

impl std::fmt::Display for FormatSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatSelector::AudioOnly => write!(f, "audio_only"),
            FormatSelector::VideoCapped => write!(f, "video_capped"),
        }
    }
}
