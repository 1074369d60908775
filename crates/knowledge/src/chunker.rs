//! Sentence-greedy, token-bounded chunking with word overlap.

use crate::clean::TextCleaner;
use crate::labels::{labels, Labels};
use crate::tokenizer::{create_counter, TokenCounter};
use crate::types::{Chunk, Document, KnowledgeBaseConfig, ProcessingStats};
use medrag_core::{AppResult, Locale};
use std::sync::Arc;

/// Characters that end a sentence. The terminator stays with its sentence.
const SENTENCE_TERMINATORS: [char; 5] = ['.', '!', '?', '।', '׃'];

/// Size limits for the chunker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerSettings {
    pub max_chunk_size: usize,
    pub overlap_words: usize,
    pub min_text_chars: usize,
}

impl Default for ChunkerSettings {
    fn default() -> Self {
        Self {
            max_chunk_size: 500,
            overlap_words: 20,
            min_text_chars: 50,
        }
    }
}

impl From<&KnowledgeBaseConfig> for ChunkerSettings {
    fn from(config: &KnowledgeBaseConfig) -> Self {
        Self {
            max_chunk_size: config.max_chunk_size,
            overlap_words: config.overlap_words,
            min_text_chars: config.min_text_chars,
        }
    }
}

/// Splits documents into passages that fit the token budget.
pub struct Chunker {
    settings: ChunkerSettings,
    labels: &'static Labels,
    cleaner: TextCleaner,
    counter: Arc<dyn TokenCounter>,
}

impl Chunker {
    pub fn new(
        settings: ChunkerSettings,
        locale: Locale,
        counter: Arc<dyn TokenCounter>,
    ) -> AppResult<Self> {
        Ok(Self {
            settings,
            labels: labels(locale),
            cleaner: TextCleaner::new()?,
            counter,
        })
    }

    /// Build a chunker from a collection config, loading its tokenizer if one is set.
    pub fn from_config(config: &KnowledgeBaseConfig, locale: Locale) -> AppResult<Self> {
        let counter = create_counter(config.tokenizer_path.as_deref())?;
        Self::new(ChunkerSettings::from(config), locale, counter)
    }

    pub fn settings(&self) -> ChunkerSettings {
        self.settings
    }

    pub fn counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    /// Header placed in front of the first chunk of a document.
    pub fn header(&self, title: &str, url: &str) -> String {
        let mut header = String::new();
        if !title.is_empty() {
            header.push_str(&format!("{}: {}\n", self.labels.title, title));
        }
        if !url.is_empty() {
            header.push_str(&format!("{}: {}\n", self.labels.source, url));
        }
        if !header.is_empty() {
            header.push('\n');
        }
        header
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        self.chunk(&document.text, &document.title, &document.url)
    }

    /// Split one document into chunks, in document order.
    pub fn chunk(&self, text: &str, title: &str, url: &str) -> Vec<Chunk> {
        let text = self.cleaner.clean(text);
        if text.chars().count() < self.settings.min_text_chars {
            return Vec::new();
        }

        let header = self.header(title, url);
        let header_tokens = self.counter.count(&header);

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current = String::new();
        let mut current_tokens = 0usize;

        for sentence in split_sentences(&text) {
            let sentence_tokens = self.counter.count(&sentence);
            let budget = if chunks.is_empty() {
                self.settings.max_chunk_size.saturating_sub(header_tokens)
            } else {
                self.settings.max_chunk_size
            };

            if current_tokens + sentence_tokens <= budget {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&sentence);
                current_tokens += sentence_tokens;
                continue;
            }

            if current.is_empty() {
                // Oversized sentence: kept whole as its own chunk
                current = sentence;
                current_tokens = sentence_tokens;
                continue;
            }

            let overlap = tail_words(&current, self.settings.overlap_words);
            let closed = std::mem::take(&mut current);
            self.push_chunk(&mut chunks, closed, current_tokens, &header, header_tokens, title, url);

            current = if overlap.is_empty() {
                sentence
            } else {
                format!("{} {}", overlap, sentence)
            };
            current_tokens = self.counter.count(&current);
        }

        if !current.is_empty() {
            self.push_chunk(&mut chunks, current, current_tokens, &header, header_tokens, title, url);
        }

        tracing::debug!(
            title = %title,
            chunks = chunks.len(),
            header_tokens,
            "Chunked document"
        );

        chunks
    }

    #[allow(clippy::too_many_arguments)]
    fn push_chunk(
        &self,
        chunks: &mut Vec<Chunk>,
        body: String,
        body_tokens: usize,
        header: &str,
        header_tokens: usize,
        title: &str,
        url: &str,
    ) {
        let sequence_index = chunks.len();
        let (content, token_count) = if sequence_index == 0 {
            (format!("{}{}", header, body), body_tokens + header_tokens)
        } else {
            (body, body_tokens)
        };

        chunks.push(Chunk {
            content,
            title: title.to_string(),
            url: url.to_string(),
            sequence_index,
            token_count,
        });
    }
}

/// Split text into trimmed sentences, each keeping its terminator.
///
/// Runs of terminators ("...", "?!") stay attached to the sentence before them.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences: Vec<String> = Vec::new();
    let mut current = String::new();

    let flush = |current: &mut String, sentences: &mut Vec<String>| {
        let trimmed = current.trim();
        if trimmed.is_empty() {
            current.clear();
            return;
        }
        if trimmed.chars().all(|c| SENTENCE_TERMINATORS.contains(&c)) {
            if let Some(last) = sentences.last_mut() {
                last.push_str(trimmed);
            }
        } else {
            sentences.push(trimmed.to_string());
        }
        current.clear();
    };

    for c in text.chars() {
        current.push(c);
        if SENTENCE_TERMINATORS.contains(&c) {
            flush(&mut current, &mut sentences);
        }
    }
    flush(&mut current, &mut sentences);

    sentences
}

/// Last `n` whitespace-separated words of `text`.
fn tail_words(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].join(" ")
}

/// Token statistics over a batch of chunks.
pub fn processing_stats(chunks: &[Chunk]) -> ProcessingStats {
    let total_tokens: usize = chunks.iter().map(|c| c.token_count).sum();
    let average_tokens_per_chunk = if chunks.is_empty() {
        0.0
    } else {
        total_tokens as f64 / chunks.len() as f64
    };

    ProcessingStats {
        total_chunks: chunks.len(),
        total_tokens,
        average_tokens_per_chunk,
        max_tokens: chunks.iter().map(|c| c.token_count).max().unwrap_or(0),
        min_tokens: chunks.iter().map(|c| c.token_count).min().unwrap_or(0),
    }
}
