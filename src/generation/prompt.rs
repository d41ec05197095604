//! Instruction prompt construction.

use super::GenerationRequest;
use crate::config::Prompts;
use std::collections::HashMap;

/// The system instruction and user message sent to a chat service.
///
/// Built once per request and handed unchanged to every service that is tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionPrompt {
    pub system: String,
    pub user: String,
}

impl InstructionPrompt {
    pub fn build(prompts: &Prompts, request: &GenerationRequest) -> Self {
        let format = request.output_format;

        let mut vars = HashMap::new();
        vars.insert("format".to_string(), format.as_str().to_string());
        vars.insert("title_example".to_string(), format.title_example().to_string());
        vars.insert("heading_example".to_string(), format.heading_example().to_string());
        vars.insert("transcript".to_string(), request.transcript.clone());

        let article = &prompts.article;
        let mut system_lines = vec![prompts.render_with_custom(&article.system, &vars)];

        if let Some(tone) = &request.tone {
            vars.insert("tone".to_string(), tone.clone());
            system_lines.push(prompts.render_with_custom(&article.tone_directive, &vars));
        }
        if let Some(audience) = &request.audience {
            vars.insert("audience".to_string(), audience.clone());
            system_lines.push(prompts.render_with_custom(&article.audience_directive, &vars));
        }

        Self {
            system: system_lines.join("\n"),
            user: prompts.render_with_custom(&article.user, &vars),
        }
    }
}
