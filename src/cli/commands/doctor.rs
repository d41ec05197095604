//! Doctor command - verify system requirements and configuration.

use super::config::config_path;
use crate::cli::Output;
use crate::config::{ProviderSettings, Settings};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn section(title: &str, checks: Vec<CheckResult>, all: &mut Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &checks {
        check.print();
    }
    println!();
    all.extend(checks);
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config: Option<&str>) -> anyhow::Result<()> {
    Output::header("Skriv Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    section(
        "External Tools",
        vec![
            check_tool("yt-dlp", "yt-dlp --version", install_hint_ytdlp(), true),
            check_tool("ffmpeg", "ffmpeg -version", install_hint_ffmpeg(), false),
            check_tool("ffprobe", "ffprobe -version", install_hint_ffmpeg(), false),
        ],
        &mut checks,
    );

    section("Credentials", check_credentials(settings), &mut checks);
    section("Directories", vec![check_temp_dir(settings)], &mut checks);
    section("Configuration", vec![check_config_file(config)], &mut checks);

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Skriv.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Skriv is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
///
/// Missing required tools are errors; missing optional ones only disable a strategy.
fn check_tool(name: &str, version_cmd: &str, hint: &str, required: bool) -> CheckResult {
    let parts: Vec<&str> = version_cmd.split_whitespace().collect();
    let (cmd, args) = match parts.split_first() {
        Some((cmd, args)) => (*cmd, args),
        None => return CheckResult::error(name, "no command", hint),
    };

    let missing = |message: &str| {
        if required {
            CheckResult::error(name, message, hint)
        } else {
            CheckResult::warning(name, &format!("{} (audio transcription disabled)", message), hint)
        }
    };

    match Command::new(cmd).args(args).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            CheckResult::ok(name, &truncate(&version, 50))
        }
        Ok(_) => missing("installed but not working"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => missing("not found"),
        Err(e) => missing(&format!("error: {}", e)),
    }
}

/// Report which credentials were resolved, without revealing them.
fn check_credentials(settings: &Settings) -> Vec<CheckResult> {
    let transcription = &settings.transcription;
    let mut results = vec![match transcription.credential() {
        Some(key) => CheckResult::ok(
            &transcription.api_key_env,
            &format!("configured ({}), model {}", mask(key), transcription.model),
        ),
        None => CheckResult::warning(
            &transcription.api_key_env,
            "not set",
            "Without it, transcripts come from captions only",
        ),
    }];

    let generation = &settings.generation;
    let primary = check_provider(&generation.primary, "primary");
    let fallback = check_provider(&generation.fallback, "fallback");

    if generation.primary.credential().is_none() && generation.fallback.credential().is_none() {
        results.push(CheckResult::error(
            &primary.name,
            &primary.message,
            &format!("Set {} or {}", generation.primary.api_key_env, generation.fallback.api_key_env),
        ));
        results.push(fallback);
    } else {
        results.push(primary);
        results.push(fallback);
    }

    results
}

fn check_provider(provider: &ProviderSettings, role: &str) -> CheckResult {
    match provider.credential() {
        Some(key) => CheckResult::ok(
            &provider.api_key_env,
            &format!("configured ({}), {} {} model {}", mask(key), role, provider.name, provider.model),
        ),
        None => CheckResult::warning(
            &provider.api_key_env,
            &format!("not set, {} service {} disabled", role, provider.name),
            &format!("Set with: export {}='...'", provider.api_key_env),
        ),
    }
}

fn check_temp_dir(settings: &Settings) -> CheckResult {
    let temp_dir = settings.temp_dir();
    if temp_dir.is_dir() {
        CheckResult::ok("Temp directory", &temp_dir.display().to_string())
    } else {
        CheckResult::warning(
            "Temp directory",
            &format!("{} (will be created)", temp_dir.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file(config: Option<&str>) -> CheckResult {
    let path = config_path(config);
    if path.exists() {
        CheckResult::ok("Config file", &path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: skriv config edit",
        )
    }
}

/// Show only the ends of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("sk-abcdefghijklmnop"), "sk-a...mnop");
    }

    #[test]
    fn test_optional_tool_missing_is_warning() {
        let result = check_tool("nope", "skriv-no-such-tool -version", "install it", false);
        assert_eq!(result.status, CheckStatus::Warning);

        let result = check_tool("nope", "skriv-no-such-tool --version", "install it", true);
        assert_eq!(result.status, CheckStatus::Error);
    }

    #[test]
    fn test_no_generation_credentials_is_error() {
        let checks = check_credentials(&Settings::default());
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0].status, CheckStatus::Warning);
        assert_eq!(checks[1].status, CheckStatus::Error);
        assert_eq!(checks[2].status, CheckStatus::Warning);
    }

    #[test]
    fn test_fallback_only_is_fine() {
        let mut settings = Settings::default();
        settings.resolve_credentials(|name| (name == "OPENROUTER_API_KEY").then(|| "or-key-123456789".to_string()));

        let checks = check_credentials(&settings);
        assert!(checks.iter().all(|c| c.status != CheckStatus::Error));
        assert_eq!(checks[2].status, CheckStatus::Ok);
    }
}
