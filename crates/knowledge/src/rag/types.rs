//! Answer bundle and citation types.

use crate::types::RetrievalResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A numbered reference to one retrieved passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based rank, matching the bracketed markers in the answer
    pub number: usize,
    pub title: String,
    pub url: String,
    /// Relevance score in `[0, 1]`
    pub score: f32,
    /// First 150 characters of the passage, newlines flattened
    pub excerpt: String,
    pub full_content: String,
}

/// Findings of the response guard for one `ask`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardReport {
    /// Instruction-override phrases found in the query
    pub override_phrases: Vec<String>,
    /// The consult-a-professional recommendation was appended to the answer
    pub recommendation_appended: bool,
}

impl GuardReport {
    pub fn override_attempt(&self) -> bool {
        !self.override_phrases.is_empty()
    }
}

/// Everything `ask` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerBundle {
    pub query: String,
    pub response: String,
    pub sources_used: usize,
    pub citations: Vec<Citation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_documents: Option<Vec<RetrievalResult>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Why retrieval came back empty, when it failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<GuardReport>,
}

/// Orchestrator stage. Transitions are strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Retrieving,
    Assembling,
    Generating,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Retrieving => "retrieving",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
            Self::Done => "done",
        }
    }

    /// The stage that follows this one; `Done` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::Retrieving,
            Self::Retrieving => Self::Assembling,
            Self::Assembling => Self::Generating,
            Self::Generating | Self::Done => Self::Done,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::Idle;
        let mut seen = vec![stage];
        while stage != Stage::Done {
            stage = stage.next();
            seen.push(stage);
        }
        let names: Vec<&str> = seen.iter().map(Stage::as_str).collect();
        assert_eq!(
            names,
            vec!["idle", "retrieving", "assembling", "generating", "done"]
        );
        assert_eq!(Stage::Done.next(), Stage::Done);
    }

    #[test]
    fn test_debug_fields_omitted_when_absent() {
        let bundle = AnswerBundle {
            query: "q".to_string(),
            response: "r".to_string(),
            sources_used: 0,
            citations: Vec::new(),
            retrieved_documents: None,
            context: None,
            retrieval_error: None,
            guard: None,
        };

        let json = serde_json::to_value(&bundle).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert!(json.get("context").is_none());
    }
}
