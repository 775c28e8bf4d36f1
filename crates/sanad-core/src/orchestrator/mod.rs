//! Verification Orchestrator
//!
//! Drives each query through:
//!
//! ```text
//! PENDING -> CACHED_SKIP                     (stored result, nothing merged)
//! PENDING -> MERGING -> VERIFYING -> DONE
//!                                 -> ERROR
//! ```
//!
//! Queries run one at a time in input order; candidates are judged one at a
//! time and judging stops at the first match. Earlier verdicts for the same
//! `(sequence_id, candidate text)` are reused instead of calling the verifier.
//! The checkpoint is rewritten after every query so an interrupted run
//! resumes from the last completed query.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::config::ConfigError;
use crate::merge::merge_verses;
use crate::records::{
    CandidateRecord, ContentKind, QueryItem, RecordError, SpanType, TextField, VerificationResult,
    VerseRecord,
};
use crate::text::clean_text;
use crate::verifier::{Verifier, VerifierError};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which span types get their verse candidates merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Only the literal `Ayah` span type
    #[default]
    ExactAyahOnly,
    /// Every span type whose content kind is a verse
    AllVerseSpans,
}

impl MergePolicy {
    /// Whether candidates of this span type are merged
    pub fn applies(&self, span: SpanType) -> bool {
        match self {
            MergePolicy::ExactAyahOnly => span == SpanType::Ayah,
            MergePolicy::AllVerseSpans => span.content_kind() == ContentKind::Verse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::ExactAyahOnly => "exact-ayah",
            MergePolicy::AllVerseSpans => "all-verse",
        }
    }
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MergePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact-ayah" => Ok(MergePolicy::ExactAyahOnly),
            "all-verse" => Ok(MergePolicy::AllVerseSpans),
            _ => Err(ConfigError::InvalidValue {
                key: "MERGE_POLICY",
                value: s.to_string(),
            }),
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub merge_policy: MergePolicy,
    /// Strip tashkeel from both texts before they reach the verifier
    pub remove_diacritics: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::default(),
            remove_diacritics: true,
        }
    }
}

// ============================================================================
// STATES, OUTCOMES AND ERRORS
// ============================================================================

/// Per-query lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Pending,
    CachedSkip,
    Merging,
    Verifying,
    Done,
    Error,
}

/// Result of processing one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub result: VerificationResult,
    /// `CachedSkip` or `Done`
    pub state: QueryState,
    /// Verifier calls actually made
    pub verifier_calls: usize,
    /// Verdicts taken from the checkpoint instead of the verifier
    pub reused: usize,
    /// Candidates without the expected text field
    pub skipped_candidates: usize,
}

/// Why one query could not be processed
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid query record: {0}")]
    Record(#[from] RecordError),
    #[error("Verifier failed: {0}")]
    Verifier(#[from] VerifierError),
}

impl QueryError {
    /// Whether the whole run must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, QueryError::Verifier(e) if e.is_fatal())
    }
}

/// Why a run stopped early
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Run aborted at sequence_id {sequence_id}: {source}")]
    Fatal {
        sequence_id: String,
        #[source]
        source: VerifierError,
    },
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// A query that failed without stopping the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub sequence_id: String,
    pub error: String,
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Queries that produced a result, cached ones included
    pub processed: usize,
    pub cached: usize,
    pub matched: usize,
    pub failures: Vec<QueryFailure>,
    pub verifier_calls: usize,
    pub reused: usize,
}

impl RunReport {
    fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            processed: 0,
            cached: 0,
            matched: 0,
            failures: Vec::new(),
            verifier_calls: 0,
            reused: 0,
        }
    }
}

// ============================================================================
// SHORT-CIRCUIT COMBINATOR
// ============================================================================

/// Judge items in order until one matches.
///
/// Returns every judged item up to and including the first match, and
/// whether a match was found. With no match the prefix is the whole input.
/// The first judging error stops iteration and is returned.
pub async fn find_first_match<I, T, F, Fut, E>(items: I, mut judge: F) -> Result<(Vec<T>, bool), E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<(T, bool), E>>,
{
    let mut prefix = Vec::new();
    for item in items {
        let (judged, is_match) = judge(item).await?;
        prefix.push(judged);
        if is_match {
            return Ok((prefix, true));
        }
    }
    Ok((prefix, false))
}

/// How one candidate was judged
#[derive(Debug)]
enum Judged {
    Verified(CandidateRecord),
    Reused(CandidateRecord),
    Skipped,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Runs verification over query items with caching and checkpointing
pub struct VerificationOrchestrator<V> {
    verifier: V,
    store: CheckpointStore,
    config: OrchestratorConfig,
}

impl<V: Verifier> VerificationOrchestrator<V> {
    pub fn new(verifier: V, store: CheckpointStore, config: OrchestratorConfig) -> Self {
        Self {
            verifier,
            store,
            config,
        }
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    pub fn into_store(self) -> CheckpointStore {
        self.store
    }

    /// Verify one query and record its result in the store
    pub async fn process_query(&mut self, item: &QueryItem) -> Result<QueryOutcome, QueryError> {
        let key = item.composite_key();
        transition(&key, QueryState::Pending);

        // Unknown labels only matter once verification is needed
        let span = item.span_type();
        let original_count = item.top_20_match_details.len();

        let candidates = match span {
            Ok(span) if self.config.merge_policy.applies(span) => {
                transition(&key, QueryState::Merging);
                merge_candidates(&key, &item.top_20_match_details)?
            }
            _ => item.top_20_match_details.clone(),
        };
        let is_merged = candidates.len() != original_count;

        if !is_merged {
            if let Some(stored) = self.store.get(&key) {
                let result = stored.clone();
                transition(&key, QueryState::CachedSkip);
                tracing::info!(sequence_id = %key, "Skipping already processed query");
                self.store.record(result.clone());
                return Ok(QueryOutcome {
                    result,
                    state: QueryState::CachedSkip,
                    verifier_calls: 0,
                    reused: 0,
                    skipped_candidates: 0,
                });
            }
        }

        let span = span.inspect_err(|e| {
            transition(&key, QueryState::Error);
            tracing::error!(sequence_id = %key, error = %e, "Cannot verify query");
        })?;
        let field = span.content_kind().text_field();

        transition(&key, QueryState::Verifying);
        let this = &*self;
        let (key_ref, query): (&str, &str) = (&key, &item.query_text);
        let judged = find_first_match(candidates, move |candidate| {
            this.judge(key_ref, query, field, candidate)
        })
        .await;

        let (judged, found) = match judged {
            Ok(outcome) => outcome,
            Err(e) => {
                transition(&key, QueryState::Error);
                return Err(e.into());
            }
        };

        let mut matches = Vec::with_capacity(judged.len());
        let (mut verifier_calls, mut reused, mut skipped_candidates) = (0, 0, 0);
        for entry in judged {
            match entry {
                Judged::Verified(candidate) => {
                    verifier_calls += 1;
                    matches.push(candidate);
                }
                Judged::Reused(candidate) => {
                    reused += 1;
                    matches.push(candidate);
                }
                Judged::Skipped => skipped_candidates += 1,
            }
        }

        let result = VerificationResult {
            id: item.question_id.clone(),
            query: item.query_text.clone(),
            sequence_id: item.sequence_id.clone(),
            span_type: item.span_type.clone(),
            matches,
        };

        if found {
            tracing::info!(sequence_id = %key, evaluated = result.matches.len(), "Match found");
        }
        transition(&key, QueryState::Done);

        self.store.record(result.clone());
        Ok(QueryOutcome {
            result,
            state: QueryState::Done,
            verifier_calls,
            reused,
            skipped_candidates,
        })
    }

    /// Process every item in order, checkpointing after each.
    ///
    /// A failed query is logged and skipped. A fatal verifier error stops the
    /// run once the results so far are saved.
    pub async fn run<I>(&mut self, items: I) -> Result<RunReport, RunError>
    where
        I: IntoIterator<Item = QueryItem>,
    {
        let mut report = RunReport::start();
        tracing::info!(
            run_id = %report.run_id,
            model = self.verifier.model_name(),
            resumed_from = self.store.prior_len(),
            "Starting verification run"
        );

        for item in items {
            let key = item.composite_key();
            match self.process_query(&item).await {
                Ok(outcome) => {
                    report.processed += 1;
                    report.verifier_calls += outcome.verifier_calls;
                    report.reused += outcome.reused;
                    if outcome.state == QueryState::CachedSkip {
                        report.cached += 1;
                    }
                    if outcome.result.is_matched() {
                        report.matched += 1;
                    }
                    self.store.save_step()?;
                }
                Err(QueryError::Verifier(source)) if source.is_fatal() => {
                    tracing::error!(sequence_id = %key, error = %source, "Fatal verifier error, stopping run");
                    self.store.save_final()?;
                    return Err(RunError::Fatal {
                        sequence_id: key,
                        source,
                    });
                }
                Err(e) => {
                    tracing::error!(sequence_id = %key, error = %e, "Error processing query");
                    report.failures.push(QueryFailure {
                        sequence_id: key,
                        error: e.to_string(),
                    });
                }
            }
        }

        self.store.save_final()?;
        report.finished_at = Some(Utc::now());
        tracing::info!(
            run_id = %report.run_id,
            processed = report.processed,
            cached = report.cached,
            matched = report.matched,
            failed = report.failures.len(),
            verifier_calls = report.verifier_calls,
            "Processing complete"
        );
        Ok(report)
    }

    /// Decide one candidate: reuse a stored verdict or ask the verifier
    async fn judge(
        &self,
        key: &str,
        query: &str,
        field: TextField,
        candidate: CandidateRecord,
    ) -> Result<(Judged, bool), VerifierError> {
        let Some(text) = candidate.text(field) else {
            tracing::warn!(sequence_id = %key, field = field.key(), "Candidate has no text, skipping");
            return Ok((Judged::Skipped, false));
        };

        if let Some(detection) = self.store.prior_detection(key, field, text) {
            tracing::debug!(sequence_id = %key, detection, "Reusing previous result");
            return Ok((Judged::Reused(candidate.with_detection(detection)), detection));
        }

        let verdict = if self.config.remove_diacritics {
            self.verifier
                .verify(&clean_text(query, true), &clean_text(text, true))
                .await?
        } else {
            self.verifier.verify(query, text).await?
        };
        let detection = verdict.is_match();
        Ok((Judged::Verified(candidate.with_detection(detection)), detection))
    }
}

/// Merge verse candidates; leave the list alone if any is not a verse record
fn merge_candidates(
    key: &str,
    candidates: &[CandidateRecord],
) -> Result<Vec<CandidateRecord>, RecordError> {
    let verses: Result<Vec<VerseRecord>, _> =
        candidates.iter().map(VerseRecord::from_candidate).collect();

    match verses {
        Ok(verses) => merge_verses(&verses)
            .iter()
            .map(|entry| entry.to_candidate())
            .collect(),
        Err(e) => {
            tracing::warn!(sequence_id = %key, error = %e, "Candidates are not verse records, not merging");
            Ok(candidates.to_vec())
        }
    }
}

fn transition(key: &str, state: QueryState) {
    tracing::debug!(sequence_id = %key, state = ?state, "Query state");
}

// ============================================================================
// TESTS
// ============================================================================
