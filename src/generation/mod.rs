//! Article generation for Skriv.
//!
//! A transcript becomes a blog post through two OpenAI-compatible chat services tried in
//! order, followed by a sanitizing pass that enforces the requested output format.

mod chain;
mod chat;
mod prompt;
mod sanitize;

pub use chain::{GeneratedArticle, GenerationChain, GenerationOutcome};
pub use chat::ChatGenerator;
pub use prompt::InstructionPrompt;
pub use sanitize::{sanitize, FormatWarning, Sanitized};

use crate::error::{Result, SkrivError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Supported article formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Html,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
        }
    }

    /// What the first line of an article must look like.
    pub fn title_example(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "'# Title'",
            OutputFormat::Html => "'<h1>Title</h1>'",
        }
    }

    pub fn heading_example(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "e.g., '## Heading'",
            OutputFormat::Html => "e.g., '<h2>Heading</h2>'",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = SkrivError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            other => Err(SkrivError::InvalidInput(format!(
                "Invalid output_format '{}'. Choose 'markdown' or 'html'.",
                other
            ))),
        }
    }
}

/// Everything the generation stage needs to write one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub transcript: String,
    pub output_format: OutputFormat,
    pub tone: Option<String>,
    pub audience: Option<String>,
}

impl GenerationRequest {
    /// Blank tone or audience values count as absent.
    pub fn new(
        transcript: impl Into<String>,
        output_format: OutputFormat,
        tone: Option<&str>,
        audience: Option<&str>,
    ) -> Self {
        let present = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            transcript: transcript.into(),
            output_format,
            tone: present(tone),
            audience: present(audience),
        }
    }
}

/// Trait for chat-style text generation services.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short service name for logs and responses.
    fn name(&self) -> &str;

    /// Send the prompt and return the raw completion text.
    async fn complete(&self, prompt: &InstructionPrompt) -> Result<String>;
}
