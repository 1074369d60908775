//! Provider identifiers and defaults.

/// Default OpenAI API base URL.
pub const OPENAI_DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default Ollama base URL.
pub const OLLAMA_DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Endpoint used when the configuration names none.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAI => OPENAI_DEFAULT_ENDPOINT,
            Self::Ollama => OLLAMA_DEFAULT_ENDPOINT,
        }
    }

    /// Whether the provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("openai"), Some(ProviderType::OpenAI));
        assert_eq!(ProviderType::parse("OpenAI"), Some(ProviderType::OpenAI));
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("claude"), None);
    }

    #[test]
    fn test_provider_defaults() {
        assert!(ProviderType::OpenAI.requires_api_key());
        assert!(!ProviderType::Ollama.requires_api_key());
        assert_eq!(ProviderType::Ollama.as_str(), "ollama");
        assert_eq!(
            ProviderType::Ollama.default_endpoint(),
            "http://localhost:11434"
        );
    }
}
