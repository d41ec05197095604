//! Configuration settings for Skriv.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure.
///
/// Built once at startup and handed to every stage constructor; stages never read the
/// process environment themselves.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub captions: CaptionSettings,
    pub generation: GenerationSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary audio artifacts.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/skriv".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Speech-to-text settings (primary transcription strategy).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Optional language hint passed to the model.
    pub language: Option<String>,
    /// Audio longer than this is split before upload.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk uploads.
    pub max_concurrent_chunks: usize,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Override for the API base URL.
    pub base_url: Option<String>,
    pub request_timeout_seconds: u64,
    /// API key (resolved at startup, never written back to disk).
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 2,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: None,
            request_timeout_seconds: 300,
            api_key: None,
        }
    }
}

/// Caption fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Accepted caption languages, in order of preference.
    pub languages: Vec<String>,
    pub request_timeout_seconds: u64,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            request_timeout_seconds: 30,
        }
    }
}

/// Article generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Sampling temperature shared by both services.
    pub temperature: f32,
    pub request_timeout_seconds: u64,
    /// Fields missing from `[generation.primary]` keep the built-in Gemini values.
    #[serde(deserialize_with = "primary_provider")]
    pub primary: ProviderSettings,
    /// Fields missing from `[generation.fallback]` keep the built-in OpenRouter values.
    #[serde(deserialize_with = "fallback_provider")]
    pub fallback: ProviderSettings,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            request_timeout_seconds: 300,
            primary: ProviderSettings::gemini(),
            fallback: ProviderSettings::openrouter(),
        }
    }
}

/// One OpenAI-compatible chat completion service.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSettings {
    /// Short name used in logs and responses.
    pub name: String,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Environment variable that overrides `model` when set. Empty disables the override.
    pub model_env: Option<String>,
    /// Extra headers sent with every request.
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl ProviderSettings {
    pub fn gemini() -> Self {
        Self {
            name: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai/".to_string(),
            model: "gemini-2.5-pro-exp-03-25".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            model_env: Some("GEMINI_MODEL_NAME".to_string()),
            headers: BTreeMap::new(),
            api_key: None,
        }
    }

    pub fn openrouter() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("HTTP-Referer".to_string(), "http://localhost".to_string());
        headers.insert("X-Title".to_string(), "skriv".to_string());

        Self {
            name: "openrouter".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "mistralai/mistral-7b-instruct:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model_env: Some("OPENROUTER_MODEL_NAME".to_string()),
            headers,
            api_key: None,
        }
    }

    /// The API key, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    fn resolve(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(&self.api_key_env) {
            self.api_key = Some(key);
        }
        let model_env = self.model_env.as_deref().filter(|name| !name.is_empty());
        if let Some(model) = model_env.and_then(|name| lookup(name)) {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
    }
}

/// A provider table as written in the config file; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProviderTable {
    name: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    model_env: Option<String>,
    headers: Option<BTreeMap<String, String>>,
}

impl ProviderTable {
    fn merge_into(self, mut provider: ProviderSettings) -> ProviderSettings {
        if let Some(name) = self.name {
            provider.name = name;
        }
        if let Some(base_url) = self.base_url {
            provider.base_url = base_url;
        }
        if let Some(model) = self.model {
            provider.model = model;
        }
        if let Some(api_key_env) = self.api_key_env {
            provider.api_key_env = api_key_env;
        }
        if let Some(model_env) = self.model_env {
            provider.model_env = Some(model_env);
        }
        if let Some(headers) = self.headers {
            provider.headers = headers;
        }
        provider
    }
}

fn primary_provider<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProviderSettings, D::Error> {
    Ok(ProviderTable::deserialize(deserializer)?.merge_into(ProviderSettings::gemini()))
}

fn fallback_provider<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ProviderSettings, D::Error> {
    Ok(ProviderTable::deserialize(deserializer)?.merge_into(ProviderSettings::openrouter()))
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory holding an `article.toml` that overrides the built-in templates.
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl TranscriptionSettings {
    /// The API key, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Fill credentials and model overrides from an environment-like lookup.
    ///
    /// Called once at process start with `std::env::var`; values already present in the
    /// config file are replaced only when the variable is set.
    pub fn resolve_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(&self.transcription.api_key_env) {
            self.transcription.api_key = Some(key);
        }
        self.generation.primary.resolve(&lookup);
        self.generation.fallback.resolve(&lookup);
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SkrivError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skriv")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_have_no_credentials() {
        let settings = Settings::default();
        assert!(settings.transcription.credential().is_none());
        assert!(settings.generation.primary.credential().is_none());
        assert!(settings.generation.fallback.credential().is_none());
        assert_eq!(settings.captions.languages, vec!["en".to_string()]);
    }

    #[test]
    fn test_resolve_credentials_from_lookup() {
        let vars = env(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENROUTER_API_KEY", "or-test"),
            ("GEMINI_MODEL_NAME", "gemini-custom"),
        ]);

        let mut settings = Settings::default();
        settings.resolve_credentials(|name| vars.get(name).cloned());

        assert_eq!(settings.transcription.credential(), Some("sk-test"));
        assert_eq!(settings.generation.primary.credential(), None);
        assert_eq!(settings.generation.primary.model, "gemini-custom");
        assert_eq!(settings.generation.fallback.credential(), Some("or-test"));
        assert_eq!(settings.generation.fallback.model, "mistralai/mistral-7b-instruct:free");
    }

    #[test]
    fn test_blank_credential_counts_as_absent() {
        let vars = env(&[("GEMINI_API_KEY", "   ")]);
        let mut settings = Settings::default();
        settings.resolve_credentials(|name| vars.get(name).cloned());
        assert!(settings.generation.primary.credential().is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [generation.fallback]
            name = "local"
            base_url = "http://localhost:11434/v1"
            model = "llama3"
            api_key_env = "LOCAL_KEY"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.generation.fallback.name, "local");
        assert_eq!(settings.generation.fallback.base_url, "http://localhost:11434/v1");
        assert_eq!(settings.generation.primary.name, "gemini");
        assert_eq!(settings.transcription.model, "whisper-1");
    }

    #[test]
    fn test_partial_provider_table_keeps_builtin_fields() {
        let mut settings: Settings = toml::from_str(
            r#"
            [generation.primary]
            model = "gemini-2.0-flash"

            [generation.fallback]
            model_env = ""
            "#,
        )
        .unwrap();

        let primary = &settings.generation.primary;
        assert_eq!(primary.model, "gemini-2.0-flash");
        assert_eq!(primary.api_key_env, "GEMINI_API_KEY");
        assert_eq!(primary.base_url, ProviderSettings::gemini().base_url);
        assert_eq!(settings.generation.fallback.headers.len(), 2);

        let vars = env(&[("GEMINI_API_KEY", "gm-test"), ("OPENROUTER_MODEL_NAME", "other")]);
        settings.resolve_credentials(|name| vars.get(name).cloned());
        assert_eq!(settings.generation.primary.credential(), Some("gm-test"));
        assert_eq!(settings.generation.fallback.model, "mistralai/mistral-7b-instruct:free");
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut settings = Settings::default();
        settings.generation.primary.api_key = Some("secret".to_string());
        let rendered = toml::to_string_pretty(&settings).unwrap();
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.general.temp_dir = "/var/tmp/skriv-test".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.general.temp_dir, "/var/tmp/skriv-test");
    }
}
