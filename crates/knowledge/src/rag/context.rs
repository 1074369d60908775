//! Context assembly: ranked passages to prompt context and citations.

use crate::labels::{labels, Labels};
use crate::rag::types::Citation;
use crate::types::RetrievalResult;
use medrag_core::Locale;

/// Maximum excerpt length in characters, before the `...` suffix.
pub const EXCERPT_CHARS: usize = 150;

#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    labels: &'static Labels,
}

impl ContextAssembler {
    pub fn new(locale: Locale) -> Self {
        Self {
            labels: labels(locale),
        }
    }

    /// The context used when nothing was retrieved.
    pub fn sentinel(&self) -> &'static str {
        self.labels.no_context
    }

    /// Build the context block and the citation list, both in rank order.
    pub fn assemble(&self, results: &[RetrievalResult]) -> (String, Vec<Citation>) {
        if results.is_empty() {
            return (self.labels.no_context.to_string(), Vec::new());
        }

        let mut context = format!("{}\n\n", self.labels.context_heading);
        let mut citations = Vec::with_capacity(results.len());

        for (i, result) in results.iter().enumerate() {
            let number = i + 1;
            let title = if result.metadata.title.trim().is_empty() {
                self.labels.untitled.to_string()
            } else {
                result.metadata.title.clone()
            };

            context.push_str(&format!(
                "{} {} ({}: {:.2}):\n{}: {}\n{}: {}\n\n",
                self.labels.document,
                number,
                self.labels.relevance,
                result.relevance_score,
                self.labels.title,
                title,
                self.labels.content,
                result.content,
            ));

            citations.push(Citation {
                number,
                title,
                url: result.metadata.url.clone(),
                score: result.relevance_score,
                excerpt: excerpt(&result.content),
                full_content: result.content.clone(),
            });
        }

        (context, citations)
    }
}

/// Flatten newlines, trim, and cut to [`EXCERPT_CHARS`] characters plus `...`.
pub fn excerpt(content: &str) -> String {
    let flat = content.replace('\n', " ");
    let flat = flat.trim();

    if flat.chars().count() <= EXCERPT_CHARS {
        return flat.to_string();
    }

    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut)
}
