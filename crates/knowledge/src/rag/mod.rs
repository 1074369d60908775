//! Retrieval-augmented answering.

pub mod ask;
pub mod context;
pub mod guard;
pub mod types;

pub use ask::{AssistantSettings, RagAssistant};
pub use context::ContextAssembler;
pub use guard::ResponseGuard;
pub use types::{AnswerBundle, Citation, GuardReport, Stage};
