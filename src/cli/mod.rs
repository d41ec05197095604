//! CLI module for Skriv.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Skriv - turn videos into blog posts
///
/// Transcribes a video (falling back to its captions) and has a language model write a
/// Markdown or HTML article from the transcript.
#[derive(Parser, Debug)]
#[command(name = "skriv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SKRIV_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Turn a video into an article
    Process {
        /// YouTube URL or video ID
        video: String,

        /// Article format (markdown, html)
        #[arg(short, long, default_value = "markdown")]
        format: String,

        /// Tone of the article (e.g. casual, formal, enthusiastic)
        #[arg(short, long)]
        tone: Option<String>,

        /// Intended audience (e.g. beginners, experts)
        #[arg(short, long)]
        audience: Option<String>,

        /// Write the article to a file ('-' for stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "skriv", "-v", "process", "dQw4w9WgXcQ", "--format", "html", "--tone", "casual",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Process {
                video,
                format,
                tone,
                audience,
                json,
                ..
            } => {
                assert_eq!(video, "dQw4w9WgXcQ");
                assert_eq!(format, "html");
                assert_eq!(tone.as_deref(), Some("casual"));
                assert_eq!(audience, None);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_defaults_to_config() {
        let cli = Cli::try_parse_from(["skriv", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { host: None, port: None }));
    }
}
