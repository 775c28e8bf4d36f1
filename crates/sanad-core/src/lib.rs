//! # Sanad Core
//!
//! Verification of scriptural spans (Quran verses and Hadith passages) detected in
//! free text. Given a query span and a ranked list of retrieval candidates, decide
//! which candidate (if any) is the source of the quoted text.
//!
//! - **Verse merging**: consecutive ayat of the same surah are collapsed into one
//!   candidate, so a quotation that spans a verse boundary can still match
//! - **Hadith retrieval**: character n-gram TF-IDF with cosine similarity
//! - **Quran retrieval**: word coverage with a proximity tie-breaker
//! - **Verification**: a chat model answers True/False per candidate, with
//!   timeout and bounded retry
//! - **Checkpointing**: results are rewritten atomically after every query so an
//!   interrupted run resumes where it stopped and earlier verdicts are reused
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sanad_core::{CheckpointStore, Config, ChatVerifier, RetryingVerifier, VerificationOrchestrator};
//!
//! let config = Config::from_env()?;
//! let verifier = RetryingVerifier::new(ChatVerifier::from_config(&config)?, config.retry_policy());
//! let store = CheckpointStore::open(config.results_folder(), &config.output_file, config.keep_step_snapshots)?;
//!
//! let queries = sanad_core::load_queries(&config.input_file)?;
//! let mut orchestrator = VerificationOrchestrator::new(verifier, store, config.orchestrator_config());
//! let report = orchestrator.run(queries).await?;
//! println!("{} of {} queries matched", report.matched, report.processed);
//! ```
//!
//! ## Feature Flags
//!
//! - `http-verifier` (default): chat verifier over HTTP for OpenAI-compatible and
//!   Ollama endpoints

#![cfg_attr(docsrs, feature(doc_cfg))]
// Only warn about missing docs for public items exported from the crate root
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod checkpoint;
pub mod config;
pub mod merge;
pub mod orchestrator;
pub mod records;
pub mod search;
pub mod text;
pub mod verifier;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Records
pub use records::{
    CandidateRecord, ContentKind, HadithRecord, MergedVerseEntry, QueryItem, RecordError,
    RecordId, SpanType, TextField, VerificationResult, VerseKey, VerseRecord,
};

// Text normalization
pub use text::{clean_text, normalize_arabic, tokenize};

// Verse merging
pub use merge::merge_verses;

// Lexical retrieval
pub use search::{
    HadithHit, HadithSearchEngine, NgramConfig, QuranCorpus, QuranSearchEngine, QuranVerse,
    SearchError, VerseHit, WordIndex,
};

// Verification
pub use verifier::{RetryPolicy, RetryingVerifier, Verdict, Verifier, VerifierError};

#[cfg(feature = "http-verifier")]
#[cfg_attr(docsrs, doc(cfg(feature = "http-verifier")))]
pub use verifier::ChatVerifier;

// Configuration
pub use config::{Config, ConfigError, Provider};

// Checkpointing
pub use checkpoint::{CheckpointError, CheckpointStore};

// Orchestration
pub use orchestrator::{
    MergePolicy, OrchestratorConfig, QueryError, QueryOutcome, QueryState, RunError, RunReport,
    VerificationOrchestrator,
};

// ============================================================================
// INPUT
// ============================================================================

/// Read the query list (a JSON array of [`QueryItem`]) from disk
pub fn load_queries(path: impl AsRef<std::path::Path>) -> Result<Vec<QueryItem>, SearchError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CandidateRecord, CheckpointStore, Config, MergePolicy, QueryItem, RetryingVerifier,
        Verdict, VerificationOrchestrator, VerificationResult, Verifier, VerifierError,
        merge_verses,
    };

    #[cfg(feature = "http-verifier")]
    pub use crate::ChatVerifier;
}
