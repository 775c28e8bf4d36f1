//! Verifier Module
//!
//! The single language-model boundary. A verifier answers one question:
//! does this canonical candidate text match this noisy query span?
//!
//! - `Verdict`: the parsed one-word reply
//! - `Verifier`: async trait every backend implements
//! - `RetryingVerifier`: per-call timeout and bounded retry around any verifier
//! - `ChatVerifier`: Ollama / OpenAI-compatible HTTP backend (`http-verifier` feature)

#[cfg(feature = "http-verifier")]
mod chat;
pub mod prompt;
mod retry;

#[cfg(feature = "http-verifier")]
#[cfg_attr(docsrs, doc(cfg(feature = "http-verifier")))]
pub use chat::ChatVerifier;

pub use retry::{RetryPolicy, RetryingVerifier};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

// ============================================================================
// VERDICT
// ============================================================================

/// Parsed verifier reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Reply was `true` (any case)
    Match,
    /// Reply was `false` (any case)
    NoMatch,
    /// Anything else
    Unparseable,
}

impl Verdict {
    /// Parse a raw model reply.
    ///
    /// ```
    /// use sanad_core::verifier::Verdict;
    ///
    /// assert_eq!(Verdict::from_reply(" True\n"), Verdict::Match);
    /// assert_eq!(Verdict::from_reply("FALSE"), Verdict::NoMatch);
    /// assert_eq!(Verdict::from_reply("True."), Verdict::Unparseable);
    /// ```
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        if reply.eq_ignore_ascii_case("true") {
            Verdict::Match
        } else if reply.eq_ignore_ascii_case("false") {
            Verdict::NoMatch
        } else {
            Verdict::Unparseable
        }
    }

    /// Detection flag for this verdict; an unparseable reply is not a match
    pub fn is_match(&self) -> bool {
        match self {
            Verdict::Match => true,
            Verdict::NoMatch | Verdict::Unparseable => false,
        }
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Verifier call failures
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifierError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),
    /// Non-success status from the model endpoint
    #[error("Model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Response carried no reply text
    #[error("Model returned an empty reply")]
    EmptyReply,
    /// Call exceeded the per-call timeout
    #[error("Verifier call timed out after {0:?}")]
    Timeout(Duration),
    /// Endpoint could not be connected to at all
    #[error("Verifier unreachable: {0}")]
    Unreachable(String),
    /// Missing or invalid verifier configuration
    #[error("Verifier configuration error: {0}")]
    Config(String),
}

impl VerifierError {
    /// Worth retrying: transport errors, timeouts, 5xx, 429 and refused connections
    pub fn is_transient(&self) -> bool {
        match self {
            VerifierError::Http(_) | VerifierError::Timeout(_) | VerifierError::Unreachable(_) => {
                true
            }
            VerifierError::Status { status, .. } => *status == 429 || *status >= 500,
            VerifierError::EmptyReply | VerifierError::Config(_) => false,
        }
    }

    /// No further query can succeed; the run should stop
    pub fn is_fatal(&self) -> bool {
        match self {
            VerifierError::Unreachable(_) | VerifierError::Config(_) => true,
            VerifierError::Status { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }
}

// ============================================================================
// VERIFIER TRAIT
// ============================================================================

/// Judges whether a candidate passage matches a query span
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Ask for a verdict on one `(query, candidate)` pair
    async fn verify(&self, query: &str, candidate: &str) -> Result<Verdict, VerifierError>;

    /// Model identifier for logs and result folders
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<V: Verifier + ?Sized> Verifier for Arc<V> {
    async fn verify(&self, query: &str, candidate: &str) -> Result<Verdict, VerifierError> {
        (**self).verify(query, candidate).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[async_trait]
impl<V: Verifier + ?Sized> Verifier for Box<V> {
    async fn verify(&self, query: &str, candidate: &str) -> Result<Verdict, VerifierError> {
        (**self).verify(query, candidate).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
