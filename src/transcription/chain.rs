//! Primary/fallback sequencing for transcription.

use super::TranscriptionStage;
use crate::audio::AudioAcquirer;
use crate::captions::CaptionFallback;
use crate::strategy::{Method, StrategyFailure};
use crate::video::VideoId;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Transcript text and the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptResult {
    /// Non-empty transcript text.
    pub text: String,
    pub method: Method,
    /// Why the primary strategy was abandoned, when the fallback produced the text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_failure: Option<StrategyFailure>,
}

/// Result of running the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionOutcome {
    Succeeded(TranscriptResult),
    Failed {
        primary: StrategyFailure,
        fallback: StrategyFailure,
    },
}

/// Acquire + transcribe, then captions.
///
/// Primary is always attempted first; captions are only consulted once the primary attempt
/// has fully resolved, including deletion of its audio artifact.
pub struct TranscriptionChain {
    acquirer: Arc<dyn AudioAcquirer>,
    stage: TranscriptionStage,
    captions: CaptionFallback,
}

impl TranscriptionChain {
    pub fn new(
        acquirer: Arc<dyn AudioAcquirer>,
        stage: TranscriptionStage,
        captions: CaptionFallback,
    ) -> Self {
        Self {
            acquirer,
            stage,
            captions,
        }
    }

    #[instrument(skip(self), fields(video_id = %video_id))]
    pub async fn transcribe(&self, video_id: &VideoId) -> TranscriptionOutcome {
        let primary = match self.try_primary(video_id).await {
            Ok(text) => {
                return TranscriptionOutcome::Succeeded(TranscriptResult {
                    text,
                    method: Method::Primary,
                    primary_failure: None,
                });
            }
            Err(failure) => failure,
        };

        warn!("Primary transcription unavailable ({}), trying captions", primary);

        match self.captions.fetch(video_id).await {
            Ok(text) => {
                info!("Transcript obtained from captions");
                TranscriptionOutcome::Succeeded(TranscriptResult {
                    text,
                    method: Method::Fallback,
                    primary_failure: Some(primary),
                })
            }
            Err(fallback) => {
                error!(
                    "Both transcription strategies failed for {}: primary: {}; fallback: {}",
                    video_id, primary, fallback
                );
                TranscriptionOutcome::Failed { primary, fallback }
            }
        }
    }

    async fn try_primary(&self, video_id: &VideoId) -> Result<String, StrategyFailure> {
        // Nothing could consume the audio, so do not download it.
        self.stage.ensure_configured()?;

        let artifact = self.acquirer.acquire(video_id).await.map_err(|e| {
            warn!("Audio acquisition failed: {}", e);
            StrategyFailure::AcquisitionFailed(e.to_string())
        })?;

        self.stage.run(artifact).await
    }
}
