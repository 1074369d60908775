//! Configuration management for MedRAG.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.medrag/config.yaml)
//!
//! The configuration is workspace-centric, with all state stored in `.medrag/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::locale::Locale;

/// Default collection name for the document index.
pub const DEFAULT_COLLECTION: &str = "oncology";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .medrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Generation provider ("openai" or "ollama")
    pub provider: String,

    /// Generation model identifier
    pub model: String,

    /// API key override for the provider
    pub api_key: Option<String>,

    /// Collection the commands operate on
    pub collection: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Assistant persona settings
    pub assistant: AssistantConfig,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,
}

/// Persona and language of the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Response language
    #[serde(default)]
    pub locale: Locale,

    /// Institution the assistant speaks for
    #[serde(default = "default_institution")]
    pub institution: String,

    /// Medical topic the assistant is scoped to
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_institution() -> String {
    "המרכז הרפואי".to_string()
}

fn default_domain() -> String {
    "אונקולוגיה".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            institution: default_institution(),
            domain: default_domain(),
        }
    }
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Custom endpoint, if one is configured.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    /// Generation model name.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Embedding model name, if configured.
    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::OpenAI {
                embedding_model, ..
            }
            | Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    assistant: Option<AssistantConfig>,
    collection: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            collection: DEFAULT_COLLECTION.to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
            assistant: AssistantConfig::default(),
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `MEDRAG_WORKSPACE`: Override workspace path
    /// - `MEDRAG_CONFIG`: Path to config file
    /// - `MEDRAG_PROVIDER`: Generation provider
    /// - `MEDRAG_MODEL`: Generation model
    /// - `MEDRAG_API_KEY`: API key
    /// - `MEDRAG_COLLECTION`: Collection name
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("MEDRAG_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("MEDRAG_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".medrag/config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("MEDRAG_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("MEDRAG_MODEL") {
            config.model = model;
        }

        if let Ok(collection) = std::env::var("MEDRAG_COLLECTION") {
            config.collection = collection;
        }

        config.api_key = std::env::var("MEDRAG_API_KEY").ok();
        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(assistant) = config_file.assistant {
            result.assistant = assistant;
        }

        if let Some(collection) = config_file.collection {
            result.collection = collection;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and YAML.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        collection: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(collection) = collection {
            self.collection = collection;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .medrag directory.
    pub fn medrag_dir(&self) -> PathBuf {
        self.workspace.join(".medrag")
    }

    /// Ensure the .medrag directory exists.
    pub fn ensure_medrag_dir(&self) -> AppResult<()> {
        let dir = self.medrag_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .medrag directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Path of the SQLite file backing every collection of this workspace.
    pub fn index_path(&self) -> PathBuf {
        self.medrag_dir().join("index.sqlite")
    }

    /// Get the configuration of a named provider.
    pub fn get_provider_config(&self, provider: &str) -> Option<ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(provider).cloned())
    }

    /// Resolve the API key for a provider.
    ///
    /// `MEDRAG_API_KEY` wins; otherwise the provider's `apiKeyEnv` variable is read.
    /// OpenAI falls back to `OPENAI_API_KEY` when nothing is configured.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => std::env::var(api_key_env).ok(),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "openai" => std::env::var("OPENAI_API_KEY").ok(),
            None => None,
        }
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = &self.provider;
        let known_providers = ["openai", "ollama"];

        if !known_providers.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                known_providers.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(provider).is_none() {
            let env_var = match self.get_provider_config(provider) {
                Some(ProviderConfig::OpenAI { api_key_env, .. }) => api_key_env,
                _ => "OPENAI_API_KEY".to_string(),
            };
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                env_var
            )));
        }

        if self.collection.trim().is_empty() {
            return Err(AppError::Config(
                "Collection name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert_eq!(config.assistant.locale, Locale::Hebrew);
        assert!(!config.verbose);
    }

    #[test]
    fn test_paths() {
        let config = AppConfig::default();
        assert!(config.medrag_dir().ends_with(".medrag"));
        assert!(config.index_path().ends_with(".medrag/index.sqlite"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("gpt-4".to_string()),
            Some("cardiology".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4");
        assert_eq!(overridden.collection, "cardiology");
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
collection: breast-cancer
assistant:
  locale: en
  institution: "City Hospital"
  domain: "oncology"
llm:
  activeProvider: openai
  activeEmbeddingProvider: openai
  providers:
    openai:
      apiKeyEnv: MY_OPENAI_KEY
      model: gpt-4o-mini
      embeddingModel: text-embedding-3-small
    ollama:
      endpoint: "http://localhost:11434"
      model: llama3.2
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.provider, "openai");
        assert_eq!(merged.model, "gpt-4o-mini");
        assert_eq!(merged.collection, "breast-cancer");
        assert_eq!(merged.assistant.locale, Locale::English);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);

        match merged.get_provider_config("ollama") {
            Some(ProviderConfig::Ollama { endpoint, .. }) => {
                assert_eq!(endpoint, "http://localhost:11434")
            }
            other => panic!("expected ollama config, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = AppConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.resolve_api_key("openai"), Some("sk-test".to_string()));
        assert!(config.validate().is_ok());
    }
}
