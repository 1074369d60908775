//! Cross-module scenarios.

mod answering;
mod ranking;
