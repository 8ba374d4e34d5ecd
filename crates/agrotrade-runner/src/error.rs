//! Error types for the negotiation runner.
//!
//! Uses `thiserror` for typed errors that surface through the runner
//! pipeline: configuration, prompt rendering, LLM calls, reply parsing.

use agrotrade_core::NegotiatorError;

/// Errors that can occur during runner operation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}

impl From<RunnerError> for NegotiatorError {
    fn from(err: RunnerError) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}
