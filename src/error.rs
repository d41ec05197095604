//! Error types for Skriv.
//!
//! Two layers: [`SkrivError`] is what a collaborator (downloader, model, caption lookup,
//! LLM client) reports, and [`PipelineError`] is the only thing that crosses
//! [`Orchestrator::process_video`](crate::orchestrator::Orchestrator::process_video).

use crate::strategy::StrategyFailure;
use thiserror::Error;

/// Library-level error type for Skriv operations.
#[derive(Error, Debug)]
pub enum SkrivError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Article generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Skriv operations.
pub type Result<T> = std::result::Result<T, SkrivError>;

/// Terminal failure of a `process_video` request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Rejected before any stage ran.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Both transcription strategies came back without usable text.
    #[error("Failed to obtain transcription (primary: {primary}; fallback: {fallback})")]
    TranscriptionUnavailable {
        primary: StrategyFailure,
        fallback: StrategyFailure,
    },

    /// Both generation services failed or were not configured.
    #[error("Failed to generate article (primary: {primary}; fallback: {fallback})")]
    GenerationUnavailable {
        primary: StrategyFailure,
        fallback: StrategyFailure,
    },
}

impl PipelineError {
    /// Short machine-readable kind, used in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::BadRequest(_) => "bad_request",
            PipelineError::TranscriptionUnavailable { .. } => "transcription_unavailable",
            PipelineError::GenerationUnavailable { .. } => "generation_unavailable",
        }
    }
}
