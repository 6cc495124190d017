//! Weather question answering for Mausam
//!
//! Answers free-text weather questions from a live forecast snapshot. A
//! chat-completion model is used when an API key is configured; every
//! failure on that path falls back to a deterministic keyword rule engine.

pub mod engine;
pub mod error;
pub mod llm;
pub mod rules;
pub mod types;

pub use engine::Assistant;
pub use error::LlmError;
pub use llm::ChatClient;
pub use types::{AnswerMode, AnswerResult};
