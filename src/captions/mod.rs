//! Caption fallback.
//!
//! When audio transcription is unavailable, a video's published captions are the next best
//! transcript. Lookups are independent of audio acquisition.

mod youtube;

pub use youtube::YtDlpCaptionSource;

use crate::strategy::{non_empty, StrategyFailure};
use crate::video::VideoId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// One timed piece of caption text.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    /// Offset into the video in seconds.
    pub start_seconds: f64,
    pub text: String,
}

impl CaptionSegment {
    pub fn new(start_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            text: text.into(),
        }
    }
}

/// Why no captions could be returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    #[error("captions are disabled for this video")]
    Disabled,

    #[error("no caption track in languages {0:?}")]
    NotFound(Vec<String>),

    #[error("caption lookup failed: {0}")]
    Lookup(String),
}

impl From<CaptionError> for StrategyFailure {
    fn from(e: CaptionError) -> Self {
        match e {
            CaptionError::Disabled => StrategyFailure::CaptionsDisabled,
            CaptionError::NotFound(_) => StrategyFailure::CaptionsNotFound,
            CaptionError::Lookup(msg) => StrategyFailure::LookupFailed(msg),
        }
    }
}

/// Trait for caption providers.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch caption segments for a video in an accepted language.
    async fn fetch_segments(&self, video_id: &VideoId) -> Result<Vec<CaptionSegment>, CaptionError>;
}

/// Flattens a caption track into transcript text.
#[derive(Clone)]
pub struct CaptionFallback {
    source: Arc<dyn CaptionSource>,
}

impl CaptionFallback {
    pub fn new(source: Arc<dyn CaptionSource>) -> Self {
        Self { source }
    }

    /// Caption text in timeline order, segments joined by single spaces.
    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn fetch(&self, video_id: &VideoId) -> Result<String, StrategyFailure> {
        info!("Fetching captions");

        let segments = self.source.fetch_segments(video_id).await.map_err(|e| {
            warn!("Captions unavailable: {}", e);
            StrategyFailure::from(e)
        })?;

        let text = join_segments(segments);
        non_empty(text).inspect_err(|_| warn!("Caption track is empty"))
    }
}

fn join_segments(mut segments: Vec<CaptionSegment>) -> String {
    segments.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

    segments
        .iter()
        .map(|s| s.text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
