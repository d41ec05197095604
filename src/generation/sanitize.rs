//! Post-processing of generated articles.
//!
//! Models often open with a line of chatter ("Sure! Here is your post:") despite being told
//! not to. Anything before the first format anchor is dropped. When no anchor can be
//! found the trimmed text is returned as-is together with a warning.

use super::OutputFormat;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::warn;

// An ATX level-one heading at the start of any line.
static MARKDOWN_H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#\s+\S+").unwrap());

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Non-fatal signal that an article does not start the way its format requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatWarning {
    /// Markdown output without any level-one heading.
    MissingHeading,
    /// HTML output without any tag.
    MissingTag,
}

impl std::fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatWarning::MissingHeading => write!(f, "no markdown heading found in output"),
            FormatWarning::MissingTag => write!(f, "no html tag found in output"),
        }
    }
}

/// A cleaned article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    /// Leading text that was discarded, if any.
    pub removed_prefix: Option<String>,
    pub warning: Option<FormatWarning>,
}

/// Strip anything in front of the first format anchor.
///
/// Never fails, and applying it to its own output changes nothing. The first match wins,
/// so a heading-like line inside a leading code block is taken as the title.
pub fn sanitize(raw: &str, format: OutputFormat) -> Sanitized {
    let trimmed = raw.trim();

    let anchor = match format {
        OutputFormat::Markdown if trimmed.starts_with('#') => Some(0),
        OutputFormat::Markdown => MARKDOWN_H1.find(trimmed).map(|m| m.start()),
        OutputFormat::Html if trimmed.starts_with('<') && trimmed.ends_with('>') => Some(0),
        OutputFormat::Html => HTML_TAG.find(trimmed).map(|m| m.start()),
    };

    match anchor {
        Some(0) => Sanitized {
            text: trimmed.to_string(),
            removed_prefix: None,
            warning: None,
        },
        Some(start) => {
            let prefix = trimmed[..start].trim();
            warn!("Removed {} chars of preamble before the first {} anchor", prefix.len(), format);
            Sanitized {
                text: trimmed[start..].trim().to_string(),
                removed_prefix: Some(prefix.to_string()),
                warning: None,
            }
        }
        None => {
            let warning = match format {
                OutputFormat::Markdown => FormatWarning::MissingHeading,
                OutputFormat::Html => FormatWarning::MissingTag,
            };
            warn!("Generated article may not comply with {}: {}", format, warning);
            Sanitized {
                text: trimmed.to_string(),
                removed_prefix: None,
                warning: Some(warning),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMATS: [OutputFormat; 2] = [OutputFormat::Markdown, OutputFormat::Html];

    #[test]
    fn test_strips_markdown_preamble() {
        let result = sanitize("Here you go:\n# My Title\nBody.", OutputFormat::Markdown);
        assert!(result.text.starts_with("# My Title"));
        assert_eq!(result.text, "# My Title\nBody.");
        assert_eq!(result.removed_prefix.as_deref(), Some("Here you go:"));
        assert_eq!(result.warning, None);
    }

    #[test]
    fn test_compliant_html_unchanged() {
        let raw = "<h1>Title</h1><p>Body</p>";
        let result = sanitize(raw, OutputFormat::Html);
        assert_eq!(result.text, raw);
        assert_eq!(result.removed_prefix, None);
        assert_eq!(result.warning, None);
    }

    #[test]
    fn test_strips_html_preamble() {
        let result = sanitize("Sure thing!\n\n<h1>T</h1>\n<p>B</p>\n", OutputFormat::Html);
        assert_eq!(result.text, "<h1>T</h1>\n<p>B</p>");
    }

    #[test]
    fn test_hashtag_is_not_a_heading() {
        let result = sanitize("Intro #rust\n\n# Title\ntext", OutputFormat::Markdown);
        assert_eq!(result.text, "# Title\ntext");
    }

    #[test]
    fn test_missing_anchor_warns_but_keeps_text() {
        let result = sanitize("  just prose  ", OutputFormat::Markdown);
        assert_eq!(result.text, "just prose");
        assert_eq!(result.warning, Some(FormatWarning::MissingHeading));

        let result = sanitize("just prose", OutputFormat::Html);
        assert_eq!(result.warning, Some(FormatWarning::MissingTag));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "plain text",
            "Here you go:\n# My Title\nBody.",
            "# Title\n\nBody",
            "Okay!\n<h1>Title</h1><p>Body</p> hope this helps",
            "<h1>Title</h1><p>Body</p>",
            "text with a <b>tag</b> inside",
            "```\n# not a title\n```\n# Real title",
            "#\n# Title",
        ];

        for format in FORMATS {
            for sample in samples {
                let once = sanitize(sample, format).text;
                let twice = sanitize(&once, format).text;
                assert_eq!(once, twice, "not idempotent for {:?} with {:?}", sample, format);
            }
        }
    }
}
