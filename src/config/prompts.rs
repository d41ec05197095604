//! Prompt templates for Skriv.
//!
//! The article prompt can be customized by placing an `article.toml` in the custom prompts
//! directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").unwrap());

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub article: ArticlePrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for article generation.
///
/// Placeholders: `{{format}}`, `{{title_example}}`, `{{heading_example}}` in `system`;
/// `{{format}}` and `{{transcript}}` in `user`; `{{tone}}` and `{{audience}}` in the
/// directives, which are appended only when the caller supplied a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticlePrompts {
    pub system: String,
    pub user: String,
    pub tone_directive: String,
    pub audience_directive: String,
}

impl Default for ArticlePrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an expert copywriter specializing in creating engaging, human-like, and SEO-optimized blog posts from video transcripts.
Your output MUST be only the raw content formatted in {{format}}. Do NOT include any conversational preamble, explanations, or text whatsoever before or after the {{format}} content.
The very first line of your response MUST be the H1 title ({{title_example}}) with absolutely no preceding characters, spaces, or text.
Use standard {{format}} syntax and ensure proper newlines for formatting.
Follow this structure:
1.  Create a catchy, SEO-friendly Title (as the very first line).
2.  Write a brief, engaging Introduction (2-3 sentences).
3.  Identify the main themes/sections in the transcript.
4.  For each theme, create a keyword-rich Section Heading ({{heading_example}}).
5.  Under each heading, write detailed paragraph(s) expanding on the theme with a natural, conversational flow.
6.  Conclude with a Key Takeaways or Conclusion section (paragraph or bullet points).
Ensure the language is natural and avoids simply listing transcript points."#
                .to_string(),

            user: r#"Generate a blog post in {{format}} based on the following transcript:

--TRANSCRIPT START--
{{transcript}}
--TRANSCRIPT END--"#
                .to_string(),

            tone_directive: "Adopt a {{tone}} tone throughout the blog post.".to_string(),

            audience_directive: "Write the blog post specifically for an audience of {{audience}}."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let article_path = custom_path.join("article.toml");
            if article_path.exists() {
                let content = std::fs::read_to_string(&article_path)?;
                prompts.article = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in one pass over the template, so substituted values are
    /// never scanned again. Unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
