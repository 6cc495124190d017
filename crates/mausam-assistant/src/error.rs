//! Chat-completion error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Chat API key is not configured")]
    NotConfigured,

    #[error("Chat API error: {0}")]
    Status(u16),

    #[error("Malformed chat response: {0}")]
    Malformed(String),

    #[error("Chat response contained no answer")]
    EmptyAnswer,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
