//! Process command implementation.

use crate::cli::output::preview;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, PipelineOutcome, ProcessRequest};
use crate::strategy::Method;
use anyhow::Result;

/// Run the process command.
pub async fn run_process(
    video: &str,
    format: &str,
    tone: Option<String>,
    audience: Option<String>,
    output: Option<String>,
    json: bool,
    settings: &Settings,
) -> Result<()> {
    // Pre-flight checks
    let warnings = preflight::check(settings);
    for warning in &warnings {
        Output::warning(warning);
    }
    if !warnings.is_empty() {
        Output::info("Run 'skriv doctor' for detailed diagnostics.");
    }

    let orchestrator = Orchestrator::new(settings)?;
    let request = ProcessRequest {
        video: video.to_string(),
        output_format: format.to_string(),
        tone,
        audience,
    };

    let spinner = Output::spinner(&format!("Processing {}...", video));
    let result = orchestrator.process_video(&request).await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
    };

    report(&outcome);

    let rendered = if json {
        serde_json::to_string_pretty(&outcome)?
    } else {
        outcome.blog_post.clone()
    };

    match output.as_deref() {
        Some(path) if path != "-" => {
            std::fs::write(path, &rendered)?;
            Output::success(&format!("Wrote {}", path));
        }
        _ => println!("{}", rendered),
    }

    Ok(())
}

fn report(outcome: &PipelineOutcome) {
    let transcript_source = match outcome.transcription_method {
        Method::Primary => "audio transcription",
        Method::Fallback => "captions",
    };
    Output::success(&format!(
        "Transcript from {} ({} chars): {}",
        transcript_source,
        outcome.transcription.len(),
        preview(&outcome.transcription, 80)
    ));

    if let Some(reason) = &outcome.transcription_primary_failure {
        Output::info(&format!("Audio transcription skipped: {}", reason));
    }

    Output::success(&format!(
        "Article written by {} ({})",
        outcome.generation_provider, outcome.generation_method
    ));

    if let Some(warning) = outcome.format_warning {
        Output::warning(&format!("{}; the article is returned as generated", warning));
    }
}
