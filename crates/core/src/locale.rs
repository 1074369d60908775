//! Response language selection.

use serde::{Deserialize, Serialize};

/// Language the assistant answers in and labels its context with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "he")]
    Hebrew,
    #[serde(rename = "en")]
    English,
}

impl Locale {
    /// Parse a locale code ("he", "en", or the full language name).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "he" | "heb" | "hebrew" | "עברית" => Some(Self::Hebrew),
            "en" | "eng" | "english" => Some(Self::English),
            _ => None,
        }
    }

    /// Short code used in prompt ids and config files.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Hebrew => "he",
            Self::English => "en",
        }
    }
}
