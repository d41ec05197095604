//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::audio::split_audio;
use crate::config::TranscriptionSettings;
use crate::error::{Result, SkrivError};
use crate::openai::{create_client, ClientOptions};
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
    language: Option<String>,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperTranscriber {
    /// Build a transcriber from settings, or `None` when no API key is configured.
    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Option<Self>> {
        let Some(api_key) = settings.credential() else {
            return Ok(None);
        };

        let client = create_client(ClientOptions {
            api_key,
            base_url: settings.base_url.as_deref(),
            headers: None,
            timeout: Some(Duration::from_secs(settings.request_timeout_seconds)),
        })?;

        Ok(Some(Self {
            client,
            model: settings.model.clone(),
            language: settings.language.clone(),
            chunk_duration_seconds: settings.chunk_duration_seconds,
            max_concurrent_chunks: settings.max_concurrent_chunks.max(1),
        }))
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<String> {
        debug!("Uploading audio to {}", self.model);

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| SkrivError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| SkrivError::OpenAI(format!("Whisper API error: {}", e)))?;

        Ok(response.text.trim().to_string())
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        // Pieces live only as long as this directory handle.
        let pieces_dir = tempfile::tempdir()?;
        let pieces = split_audio(audio_path, pieces_dir.path(), self.chunk_duration_seconds).await?;

        if pieces.len() > 1 {
            info!("Transcribing {} audio pieces with {}", pieces.len(), self.model);
        }

        let texts: Vec<String> = stream::iter(pieces)
            .map(|piece| async move { self.transcribe_single(&piece).await })
            .buffered(self.max_concurrent_chunks)
            .try_collect()
            .await?;

        Ok(texts
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}
