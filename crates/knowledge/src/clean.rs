//! Text cleanup applied before chunking.

use medrag_core::{AppError, AppResult};
use regex::Regex;

/// Strips whitespace noise and web/navigation leftovers from scraped text.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    whitespace: Regex,
    web_artifacts: Regex,
    english_navigation: Regex,
    hebrew_navigation: Regex,
}

impl TextCleaner {
    pub fn new() -> AppResult<Self> {
        Ok(Self {
            whitespace: compile(r"\s+")?,
            web_artifacts: compile(r"(?i)skip to main content|cookies?|javascript")?,
            english_navigation: compile(r"\b(?:Home|Contact|About|Menu|Search|Login|Register)\b")?,
            hebrew_navigation: compile(r"לחץ כאן|קישור|תפריט|חפש|התחבר|הירשם")?,
        })
    }

    /// Collapse whitespace, drop known artifacts, then collapse again.
    pub fn clean(&self, text: &str) -> String {
        let text = self.normalize_whitespace(text);
        let text = self.web_artifacts.replace_all(&text, "");
        let text = self.english_navigation.replace_all(&text, "");
        let text = self.hebrew_navigation.replace_all(&text, "");
        self.normalize_whitespace(&text)
    }

    fn normalize_whitespace(&self, text: &str) -> String {
        self.whitespace.replace_all(text, " ").trim().to_string()
    }
}

fn compile(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern).map_err(|e| AppError::Other(format!("Invalid cleanup pattern: {}", e)))
}
