//! Skriv - video to blog post
//!
//! Turns a video into a formatted article. The name "Skriv" is the Norwegian word for
//! "write."
//!
//! # Overview
//!
//! One request runs three stages in order:
//! - **Transcription**: download the audio and run Whisper on it; if anything about that
//!   fails, use the video's published captions instead.
//! - **Generation**: ask a primary chat service for a Markdown or HTML article, and a
//!   fallback service with the identical prompt if the primary is unavailable.
//! - **Sanitizing**: drop any chatter the model put in front of the article.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `video` - Video identifiers
//! - `strategy` - Primary/fallback bookkeeping shared by both chains
//! - `audio` - Audio download and scoped temporary artifacts
//! - `transcription` - Speech-to-text and the transcription chain
//! - `captions` - Caption lookup
//! - `generation` - Prompting, chat services, the generation chain and the sanitizer
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use skriv::config::Settings;
//! use skriv::orchestrator::{Orchestrator, ProcessRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut settings = Settings::load()?;
//!     settings.resolve_credentials(|name| std::env::var(name).ok());
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let request = ProcessRequest {
//!         video: "dQw4w9WgXcQ".to_string(),
//!         output_format: "markdown".to_string(),
//!         tone: Some("casual".to_string()),
//!         audience: None,
//!     };
//!     let outcome = orchestrator.process_video(&request).await?;
//!     println!("{}", outcome.blog_post);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod captions;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod strategy;
pub mod transcription;
pub mod video;

pub use error::{PipelineError, Result, SkrivError};
