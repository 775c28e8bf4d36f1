//! Records Module - Core types and data structures
//!
//! Wire-compatible record types shared by the merger, the search engines
//! and the verification orchestrator:
//! - Verse records and merged verse runs
//! - Hadith records
//! - Query items, candidates and verification results
//! - Span type to content kind mapping

mod hadith;
mod query;
mod verse;

pub use hadith::HadithRecord;
pub use query::{
    CandidateRecord, ContentKind, QueryItem, SpanType, TextField, VerificationResult,
    DETECTION_FIELD,
};
pub use verse::{MergedVerseEntry, VerseKey, VerseRecord};

use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Record-level data errors
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// `span_type` is not one of the known labels
    #[error("Unknown span_type: {0}")]
    UnknownSpanType(String),
    /// `verse_id` is not of the form `surah:ayah` with positive integers
    #[error("Invalid verse id: {0:?}")]
    InvalidVerseId(String),
    /// A candidate did not serialize to a JSON object
    #[error("Candidate is not a JSON object")]
    NotAnObject,
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Identifier that upstream files write either as a number or a string.
///
/// The original representation is kept so results serialize back exactly
/// as they were read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Integer id
    Int(i64),
    /// String id
    Text(String),
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}
