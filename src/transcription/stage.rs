//! Primary transcription over a downloaded audio artifact.

use super::Transcriber;
use crate::audio::AudioArtifact;
use crate::strategy::{non_empty, Provider, StrategyFailure};
use tracing::{info, instrument, warn};

/// Runs the speech-recognition model and disposes of the artifact it was given.
#[derive(Clone)]
pub struct TranscriptionStage {
    transcriber: Provider<dyn Transcriber>,
}

impl TranscriptionStage {
    pub fn new(transcriber: Provider<dyn Transcriber>) -> Self {
        Self { transcriber }
    }

    pub fn is_configured(&self) -> bool {
        self.transcriber.is_configured()
    }

    /// Fails with the missing credential when no model is available.
    pub fn ensure_configured(&self) -> Result<(), StrategyFailure> {
        self.transcriber.get().map(|_| ())
    }

    /// Transcribe `artifact`, consuming it.
    ///
    /// The artifact's file is gone by the time this returns, whatever the outcome: it is
    /// released explicitly after the model call, and by its destructor if this future is
    /// dropped or unwinds before that.
    #[instrument(skip_all, fields(audio_path = %artifact.path().display()))]
    pub async fn run(&self, artifact: AudioArtifact) -> Result<String, StrategyFailure> {
        let result = match self.transcriber.get() {
            Ok(transcriber) => {
                info!("Transcribing audio with primary model");
                transcriber
                    .transcribe(artifact.path())
                    .await
                    .map_err(|e| StrategyFailure::TranscriptionFailed(e.to_string()))
            }
            Err(missing) => Err(missing),
        };

        drop(artifact);

        match result.and_then(non_empty) {
            Ok(text) => {
                info!("Primary transcription complete ({} chars)", text.len());
                Ok(text)
            }
            Err(failure) => {
                warn!("Primary transcription failed: {}", failure);
                Err(failure)
            }
        }
    }
}
