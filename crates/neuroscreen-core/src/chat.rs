//! Assistant persona and chat errors.
//!
//! The transport lives in `neuroscreen-adapters`; this module only fixes what
//! the assistant is told and which messages are acceptable.

use thiserror::Error;

/// System instruction sent with every chat request.
pub const PERSONA: &str = "\
You are NeuroScreen Assistant.
You help users understand ADHD and Autism.
You NEVER diagnose.
You always suggest consulting professionals politely.
You explain in simple, calm language.";

/// Chat relay failures.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The user message was empty or whitespace.
    #[error("message must not be empty")]
    EmptyMessage,

    /// The language model service failed or returned no text.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// No API key is configured.
    #[error("chat is not configured")]
    NotConfigured,
}

impl ChatError {
    /// Whether the error was caused by client input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyMessage)
    }
}

/// Trims `message` and rejects it if nothing is left.
///
/// # Errors
///
/// Returns [`ChatError::EmptyMessage`] for empty or whitespace-only input.
pub fn validate_message(message: &str) -> Result<&str, ChatError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        Err(ChatError::EmptyMessage)
    } else {
        Ok(trimmed)
    }
}
