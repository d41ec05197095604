//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available before a request is
//! started, and reports which fallbacks will be used when something optional is missing.

use crate::config::Settings;
use crate::error::{Result, SkrivError};
use std::process::Command;

/// Run pre-flight checks.
///
/// Nothing here is fatal: a missing tool or credential only makes a strategy unavailable,
/// and the pipeline reports that as a typed error for the request that hits it.
pub fn check(settings: &Settings) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Err(e) = check_tool("yt-dlp") {
        warnings.push(format!("{}; audio download and caption lookup will fail", e));
    }

    if settings.transcription.credential().is_none() {
        warnings.push(format!(
            "{} not set; transcripts will come from captions only",
            settings.transcription.api_key_env
        ));
    } else if let Err(e) = check_tool("ffmpeg").and_then(|_| check_tool("ffprobe")) {
        warnings.push(format!("{}; audio transcription will fail over to captions", e));
    }

    let generation = &settings.generation;
    match (generation.primary.credential(), generation.fallback.credential()) {
        (None, None) => warnings.push(format!(
            "No generation service configured; requests will fail until {} or {} is set",
            generation.primary.api_key_env, generation.fallback.api_key_env
        )),
        (None, Some(_)) => warnings.push(format!(
            "{} not set; articles will be written by {}",
            generation.primary.api_key_env, generation.fallback.name
        )),
        _ => {}
    }

    warnings
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SkrivError::ToolFailed(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SkrivError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SkrivError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_reported() {
        let err = check_tool("skriv-no-such-tool").unwrap_err();
        assert!(matches!(err, SkrivError::ToolNotFound(name) if name == "skriv-no-such-tool"));
    }

    #[test]
    fn test_missing_generation_keys_only_warn() {
        let warnings = check(&Settings::default());
        assert!(warnings
            .iter()
            .any(|w| w.contains("GEMINI_API_KEY") && w.contains("OPENROUTER_API_KEY")));
        assert!(warnings.iter().any(|w| w.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn test_fallback_only_generation_warns() {
        let mut settings = Settings::default();
        settings.resolve_credentials(|name| (name == "OPENROUTER_API_KEY").then(|| "or-key".to_string()));

        let warnings = check(&settings);
        assert!(warnings
            .iter()
            .any(|w| w.starts_with("GEMINI_API_KEY not set") && w.contains("openrouter")));
        assert!(!warnings.iter().any(|w| w.contains("No generation service")));
    }
}
