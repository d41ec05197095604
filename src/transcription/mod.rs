//! Transcription module for Skriv.
//!
//! Turns a video into transcript text. The primary strategy downloads the audio and runs
//! Whisper on it; when that fails in any way, the video's own captions are used instead.
//!
//! - [`TranscriptionStage`] runs the model over an [`AudioArtifact`](crate::audio::AudioArtifact)
//!   and always disposes of it.
//! - [`TranscriptionChain`] sequences acquisition, the stage, and the caption fallback.

mod chain;
mod stage;
mod whisper;

pub use chain::{TranscriptResult, TranscriptionChain, TranscriptionOutcome};
pub use stage::TranscriptionStage;
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for speech-recognition services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return the full text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}
