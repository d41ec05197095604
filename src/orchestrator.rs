//! Pipeline orchestrator for Skriv.
//!
//! Runs one request end to end: transcript, article, sanitizing. Stages run strictly one
//! after another and every collaborator failure is absorbed into a strategy failure; only
//! [`PipelineError`] leaves [`Orchestrator::process_video`].

use crate::audio::{AudioAcquirer, YtDlpAcquirer};
use crate::captions::{CaptionFallback, CaptionSource, YtDlpCaptionSource};
use crate::config::{Prompts, ProviderSettings, Settings};
use crate::error::{PipelineError, Result};
use crate::generation::{
    sanitize, ChatGenerator, FormatWarning, GenerationChain, GenerationOutcome,
    GenerationRequest, OutputFormat, TextGenerator,
};
use crate::strategy::{Method, Provider, StrategyFailure};
use crate::transcription::{
    Transcriber, TranscriptionChain, TranscriptionOutcome, TranscriptionStage, WhisperTranscriber,
};
use crate::video::VideoId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Parameters of one `process_video` call, as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    /// Video identifier or URL.
    pub video: String,
    /// `markdown` or `html`.
    pub output_format: String,
    pub tone: Option<String>,
    pub audience: Option<String>,
}

/// The externally visible result of a processed video.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub video_id: VideoId,
    pub transcription_method: Method,
    /// Why the primary transcription was abandoned, when captions were used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_primary_failure: Option<StrategyFailure>,
    pub generation_method: Method,
    pub generation_provider: String,
    pub output_format: OutputFormat,
    pub tone: Option<String>,
    pub audience: Option<String>,
    pub transcription: String,
    pub blog_post: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_warning: Option<FormatWarning>,
    pub processed_at: DateTime<Utc>,
}

/// The main orchestrator for the Skriv pipeline.
pub struct Orchestrator {
    transcription: TranscriptionChain,
    generation: GenerationChain,
}

impl Orchestrator {
    /// Create an orchestrator from resolved settings.
    ///
    /// Services whose credential is missing are left unconfigured; their strategy is then
    /// skipped at request time rather than failing here.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let acquirer: Arc<dyn AudioAcquirer> = Arc::new(YtDlpAcquirer::new(temp_dir));

        let transcriber = WhisperTranscriber::from_settings(&settings.transcription)?
            .map(|t| Arc::new(t) as Arc<dyn Transcriber>);
        let transcriber = Provider::from_option(transcriber, &settings.transcription.api_key_env);

        let captions: Arc<dyn CaptionSource> =
            Arc::new(YtDlpCaptionSource::from_settings(&settings.captions)?);

        let generation = &settings.generation;
        let chat_service = |provider: &ProviderSettings| -> Result<Provider<dyn TextGenerator>> {
            let generator = ChatGenerator::from_settings(
                provider,
                generation.temperature,
                generation.request_timeout_seconds,
            )?
            .map(|g| Arc::new(g) as Arc<dyn TextGenerator>);

            match &generator {
                Some(_) => info!("Generation service {} uses model {}", provider.name, provider.model),
                None => info!("Generation service {} has no {}", provider.name, provider.api_key_env),
            }
            Ok(Provider::from_option(generator, &provider.api_key_env))
        };
        let primary = chat_service(&generation.primary)?;
        let fallback = chat_service(&generation.fallback)?;

        Ok(Self::with_components(
            TranscriptionChain::new(
                acquirer,
                TranscriptionStage::new(transcriber),
                CaptionFallback::new(captions),
            ),
            GenerationChain::new(primary, fallback, prompts),
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(transcription: TranscriptionChain, generation: GenerationChain) -> Self {
        Self {
            transcription,
            generation,
        }
    }

    /// Turn a video into a sanitized article.
    #[instrument(skip(self, request), fields(video = %request.video, format = %request.output_format))]
    pub async fn process_video(
        &self,
        request: &ProcessRequest,
    ) -> std::result::Result<PipelineOutcome, PipelineError> {
        let output_format = request
            .output_format
            .parse::<OutputFormat>()
            .map_err(|e| PipelineError::BadRequest(e.to_string()))?;
        let video_id =
            VideoId::parse(&request.video).map_err(|e| PipelineError::BadRequest(e.to_string()))?;

        info!("Processing video {} as {}", video_id, output_format);

        let transcript = match self.transcription.transcribe(&video_id).await {
            TranscriptionOutcome::Succeeded(result) => result,
            TranscriptionOutcome::Failed { primary, fallback } => {
                return Err(PipelineError::TranscriptionUnavailable { primary, fallback });
            }
        };

        let generation_request = GenerationRequest::new(
            transcript.text.clone(),
            output_format,
            request.tone.as_deref(),
            request.audience.as_deref(),
        );

        let article = match self.generation.generate(&generation_request).await {
            GenerationOutcome::Generated(article) => article,
            GenerationOutcome::Failed { primary, fallback } => {
                return Err(PipelineError::GenerationUnavailable { primary, fallback });
            }
        };

        let cleaned = sanitize(&article.text, output_format);

        info!(
            "Finished {} (transcript: {}, article: {} via {})",
            video_id, transcript.method, article.method, article.service
        );

        Ok(PipelineOutcome {
            video_id,
            transcription_method: transcript.method,
            transcription_primary_failure: transcript.primary_failure,
            generation_method: article.method,
            generation_provider: article.service,
            output_format,
            tone: generation_request.tone,
            audience: generation_request.audience,
            transcription: transcript.text,
            blog_post: cleaned.text,
            format_warning: cleaned.warning,
            processed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioArtifact;
    use crate::captions::{CaptionError, CaptionSegment};
    use crate::error::SkrivError;
    use crate::generation::InstructionPrompt;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unconfigured(credential: &str) -> Provider<dyn TextGenerator> {
        Provider::Unconfigured {
            credential: credential.to_string(),
        }
    }

    struct FakeAcquirer {
        dir: Option<PathBuf>,
    }

    #[async_trait]
    impl AudioAcquirer for FakeAcquirer {
        async fn acquire(&self, video_id: &VideoId) -> Result<AudioArtifact> {
            let Some(dir) = &self.dir else {
                return Err(SkrivError::AudioDownload("no audio source".to_string()));
            };
            let path = dir.join(format!("{}.mp3", video_id.file_stem()));
            std::fs::write(&path, b"audio")?;
            Ok(AudioArtifact::new(path))
        }
    }

    struct FakeTranscriber;

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<String> {
            Ok("today we talk about ownership".to_string())
        }
    }

    struct FakeCaptions(std::result::Result<&'static str, CaptionError>);

    #[async_trait]
    impl CaptionSource for FakeCaptions {
        async fn fetch_segments(
            &self,
            _video_id: &VideoId,
        ) -> std::result::Result<Vec<CaptionSegment>, CaptionError> {
            self.0.clone().map(|t| vec![CaptionSegment::new(0.0, t)])
        }
    }

    struct CountingGenerator {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl CountingGenerator {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for CountingGenerator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, _prompt: &InstructionPrompt) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    fn transcription(
        audio_dir: Option<&Path>,
        transcriber: bool,
        captions: std::result::Result<&'static str, CaptionError>,
    ) -> TranscriptionChain {
        let transcriber: Provider<dyn Transcriber> = if transcriber {
            Provider::Configured(Arc::new(FakeTranscriber))
        } else {
            Provider::Unconfigured {
                credential: "OPENAI_API_KEY".to_string(),
            }
        };

        TranscriptionChain::new(
            Arc::new(FakeAcquirer {
                dir: audio_dir.map(Path::to_path_buf),
            }),
            TranscriptionStage::new(transcriber),
            CaptionFallback::new(Arc::new(FakeCaptions(captions))),
        )
    }

    fn generation(generator: &Arc<CountingGenerator>) -> GenerationChain {
        GenerationChain::new(
            Provider::Configured(generator.clone()),
            unconfigured("OPENROUTER_API_KEY"),
            Prompts::default(),
        )
    }

    fn request(format: &str) -> ProcessRequest {
        ProcessRequest {
            video: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            output_format: format.to_string(),
            tone: Some("casual".to_string()),
            audience: None,
        }
    }

    #[tokio::test]
    async fn test_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CountingGenerator::new("Sure!\n# Ownership\nBody.");
        let orchestrator = Orchestrator::with_components(
            transcription(Some(dir.path()), true, Err(CaptionError::Disabled)),
            generation(&generator),
        );

        let outcome = orchestrator.process_video(&request("markdown")).await.unwrap();

        assert_eq!(outcome.video_id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(outcome.transcription_method, Method::Primary);
        assert_eq!(outcome.transcription, "today we talk about ownership");
        assert_eq!(outcome.generation_method, Method::Primary);
        assert_eq!(outcome.blog_post, "# Ownership\nBody.");
        assert_eq!(outcome.tone.as_deref(), Some("casual"));
        assert_eq!(outcome.format_warning, None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_caption_fallback_is_reported() {
        let generator = CountingGenerator::new("<h1>T</h1>");
        let orchestrator = Orchestrator::with_components(
            transcription(None, true, Ok("from captions")),
            generation(&generator),
        );

        let outcome = orchestrator.process_video(&request("html")).await.unwrap();

        assert_eq!(outcome.transcription_method, Method::Fallback);
        assert!(matches!(
            outcome.transcription_primary_failure,
            Some(StrategyFailure::AcquisitionFailed(_))
        ));
        assert_eq!(outcome.output_format, OutputFormat::Html);
    }

    #[tokio::test]
    async fn test_bad_format_rejected_before_any_stage() {
        let generator = CountingGenerator::new("# T");
        let orchestrator = Orchestrator::with_components(
            transcription(None, true, Ok("unused")),
            generation(&generator),
        );

        let err = orchestrator.process_video(&request("pdf")).await.unwrap_err();

        assert!(matches!(err, PipelineError::BadRequest(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transcription_failure_never_generates() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CountingGenerator::new("# T");
        let orchestrator = Orchestrator::with_components(
            transcription(Some(dir.path()), false, Err(CaptionError::NotFound(vec!["en".to_string()]))),
            generation(&generator),
        );

        let err = orchestrator.process_video(&request("markdown")).await.unwrap_err();

        assert_eq!(
            err,
            PipelineError::TranscriptionUnavailable {
                primary: StrategyFailure::MissingCredential("OPENAI_API_KEY".to_string()),
                fallback: StrategyFailure::CaptionsNotFound,
            }
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_available_fails_at_transcription() {
        let orchestrator = Orchestrator::with_components(
            transcription(None, false, Err(CaptionError::Disabled)),
            GenerationChain::new(
                unconfigured("GEMINI_API_KEY"),
                unconfigured("OPENROUTER_API_KEY"),
                Prompts::default(),
            ),
        );

        let err = orchestrator.process_video(&request("markdown")).await.unwrap_err();

        assert_eq!(err.kind(), "transcription_unavailable");
    }

    #[tokio::test]
    async fn test_generation_failure() {
        let orchestrator = Orchestrator::with_components(
            transcription(None, false, Ok("caption text")),
            GenerationChain::new(
                unconfigured("GEMINI_API_KEY"),
                unconfigured("OPENROUTER_API_KEY"),
                Prompts::default(),
            ),
        );

        let err = orchestrator.process_video(&request("markdown")).await.unwrap_err();

        assert!(matches!(err, PipelineError::GenerationUnavailable { .. }));
    }
}
