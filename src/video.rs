//! Video identifiers.

use crate::error::{Result, SkrivError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Watch/share/embed URLs; the id is the 11-character token after the route.
static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:https?://)?
        (?:www\.|m\.)?
        (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
        ([a-zA-Z0-9_-]{11})
        ",
    )
    .unwrap()
});

/// Opaque, caller-supplied identifier of a source video.
///
/// Correlates the audio artifact, the caption lookup and log lines for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Parse a bare identifier or a YouTube URL.
    ///
    /// URLs are reduced to their video id; any other non-empty token is kept verbatim.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SkrivError::InvalidInput("video id must not be empty".to_string()));
        }

        if let Some(caps) = YOUTUBE_URL.captures(input) {
            return Ok(Self(caps[1].to_string()));
        }

        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public watch URL handed to yt-dlp.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    /// Filesystem-safe stem derived from the id.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for VideoId {
    type Err = SkrivError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
