//! Search Module
//!
//! Lexical retrieval of candidate passages for a query span:
//! - Hadith search over character n-gram TF-IDF vectors (cosine similarity)
//! - Quran search by query-word coverage and word proximity
//!
//! Both engines are built once and then queried read-only.

mod hadith;
mod quran;

pub use hadith::{load_corpus, HadithHit, HadithSearchEngine, NgramConfig};

pub use quran::{
    coverage_score, proximity_score, QuranCorpus, QuranSearchEngine, QuranVerse, VerseHit,
    WordIndex,
};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors raised while loading a corpus or building an index
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No records to index
    #[error("Corpus is empty")]
    EmptyCorpus,
    /// Document-frequency pruning removed every term
    #[error("No terms remain after document-frequency pruning")]
    EmptyVocabulary,
    /// N-gram or pruning parameters out of range
    #[error("Invalid index configuration: {0}")]
    InvalidConfig(String),
    /// Corpus file could not be read
    #[error("Failed to read corpus: {0}")]
    Io(#[from] std::io::Error),
    /// Corpus file is not the expected JSON shape
    #[error("Invalid corpus JSON: {0}")]
    Json(#[from] serde_json::Error),
}
