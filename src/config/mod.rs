//! Configuration module for Skriv.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ArticlePrompts, Prompts};
pub use settings::{
    CaptionSettings, GeneralSettings, GenerationSettings, PromptSettings, ProviderSettings,
    ServerSettings, Settings, TranscriptionSettings,
};
