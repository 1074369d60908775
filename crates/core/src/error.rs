//! Error types for MedRAG.
//!
//! This module defines a unified error enum that covers all error categories
//! in the workspace: configuration, I/O, generation providers, embeddings,
//! the vector index, ingestion, and prompts.

use thiserror::Error;

/// Unified error type for MedRAG.
///
/// All library functions return `Result<T, AppError>`. Query-time callers
/// decide whether to degrade or propagate; nothing panics.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generation provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index storage errors
    #[error("Index error: {0}")]
    Index(String),

    /// Malformed or missing ingestion input
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
