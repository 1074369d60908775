//! Generation-provider crate for MedRAG.
//!
//! This crate provides a provider-agnostic abstraction for requesting a single
//! completion from a Large Language Model. The answering pipeline only ever
//! sends `{system, user, temperature, max_tokens}` and reads one completion back.
//!
//! # Providers
//! - **OpenAI**: Chat Completions API
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use medrag_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("מה זה כימותרפיה?", "llama3.2")
//!     .with_system("ענה בעברית בלבד.")
//!     .with_temperature(0.3);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
