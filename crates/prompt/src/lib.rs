//! Prompt system for MedRAG.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions (system and user templates)
//! - Handlebars template rendering
//! - Built-in guarded answering prompts per locale
//! - Workspace overrides under `.medrag/prompts/`

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, prompt_id_for, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
