//! OpenAI-compatible chat completion client.

use super::{InstructionPrompt, TextGenerator};
use crate::config::ProviderSettings;
use crate::error::{Result, SkrivError};
use crate::openai::{create_client, ClientOptions};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// One chat completion service, such as Gemini's or OpenRouter's OpenAI endpoint.
pub struct ChatGenerator {
    client: Client<OpenAIConfig>,
    name: String,
    model: String,
    temperature: f32,
}

impl ChatGenerator {
    /// Build a generator from settings, or `None` when no API key is configured.
    pub fn from_settings(
        settings: &ProviderSettings,
        temperature: f32,
        timeout_seconds: u64,
    ) -> Result<Option<Self>> {
        let Some(api_key) = settings.credential() else {
            return Ok(None);
        };

        let client = create_client(ClientOptions {
            api_key,
            base_url: Some(settings.base_url.as_str()).filter(|u| !u.is_empty()),
            headers: Some(&settings.headers),
            timeout: Some(Duration::from_secs(timeout_seconds)),
        })?;

        Ok(Some(Self {
            client,
            name: settings.name.clone(),
            model: settings.model.clone(),
            temperature,
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for ChatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, prompt), fields(service = %self.name, model = %self.model))]
    async fn complete(&self, prompt: &InstructionPrompt) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt.system.clone())
                .build()
                .map_err(|e| SkrivError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.user.clone())
                .build()
                .map_err(|e| SkrivError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| SkrivError::Generation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            SkrivError::OpenAI(format!("{} chat completion failed: {}", self.name, e))
        })?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("Received {} chars from {}", text.len(), self.name);

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_means_no_generator() {
        let settings = ProviderSettings::gemini();
        assert!(ChatGenerator::from_settings(&settings, 0.7, 30).unwrap().is_none());
    }

    #[test]
    fn test_blank_key_means_no_generator() {
        let settings = ProviderSettings {
            api_key: Some("   ".to_string()),
            ..ProviderSettings::openrouter()
        };
        assert!(ChatGenerator::from_settings(&settings, 0.7, 30).unwrap().is_none());
    }

    #[test]
    fn test_key_builds_generator() {
        let settings = ProviderSettings {
            api_key: Some("or-test".to_string()),
            ..ProviderSettings::openrouter()
        };
        let generator = ChatGenerator::from_settings(&settings, 0.7, 30).unwrap().unwrap();
        assert_eq!(generator.name(), "openrouter");
        assert_eq!(generator.model(), "mistralai/mistral-7b-instruct:free");
    }
}
