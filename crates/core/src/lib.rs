//! MedRAG Core Library
//!
//! This crate provides the foundational utilities shared by every MedRAG crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Response locale selection

pub mod config;
pub mod error;
pub mod locale;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use locale::Locale;
