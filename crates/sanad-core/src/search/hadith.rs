//! Hadith Search
//!
//! Character n-gram TF-IDF over the normalized narration, matn and title of
//! every hadith. Character n-grams tolerate the segmentation and spelling
//! drift of quoted Arabic far better than whole-word tokens.
//!
//! Weighting:
//! - term frequency is sublinear, `1 + ln(tf)`
//! - idf is smoothed, `ln((1 + n) / (1 + df)) + 1`
//! - every row is L2-normalized, so cosine similarity is a dot product
//!
//! Document vectors are stored as posting lists keyed by term id; a query
//! only touches the postings of its own n-grams.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SearchError;
use crate::records::{CandidateRecord, HadithRecord, RecordError, RecordId};
use crate::text::{normalize_arabic, normalize_for_index};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Vectorizer parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NgramConfig {
    /// Shortest n-gram, in characters
    pub min_n: usize,
    /// Longest n-gram, in characters
    pub max_n: usize,
    /// Vocabulary cap after pruning
    pub max_features: usize,
    /// Terms in fewer documents than this are dropped
    pub min_df: usize,
    /// Terms in more than this fraction of documents are dropped
    pub max_df: f64,
    /// Use `1 + ln(tf)` instead of raw counts
    pub sublinear_tf: bool,
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self {
            min_n: 1,
            max_n: 7,
            max_features: 4000,
            min_df: 1,
            max_df: 0.95,
            sublinear_tf: true,
        }
    }
}

impl NgramConfig {
    fn validate(&self) -> Result<(), SearchError> {
        if self.min_n == 0 || self.min_n > self.max_n {
            return Err(SearchError::InvalidConfig(format!(
                "n-gram range {}..={} is empty",
                self.min_n, self.max_n
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(SearchError::InvalidConfig(format!(
                "max_df {} must be in (0, 1]",
                self.max_df
            )));
        }
        if self.max_features == 0 {
            return Err(SearchError::InvalidConfig("max_features must be positive".into()));
        }
        Ok(())
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// One ranked hadith, in the same shape as a `top_20_match_details` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HadithHit {
    #[serde(rename = "hadithID")]
    pub hadith_id: RecordId,
    /// Cosine similarity in `(0, 1]`
    pub similarity_score: f64,
    pub title: String,
    #[serde(rename = "hadithTxt")]
    pub hadith_txt: String,
    #[serde(rename = "Matn")]
    pub matn: String,
}

impl HadithHit {
    /// Convert into a verification candidate
    pub fn to_candidate(&self) -> Result<CandidateRecord, RecordError> {
        CandidateRecord::from_serialize(self)
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Read-only TF-IDF index over a hadith corpus
#[derive(Debug, Clone)]
pub struct HadithSearchEngine {
    config: NgramConfig,
    records: Vec<HadithRecord>,
    /// term -> term id
    vocabulary: HashMap<String, usize>,
    /// term id -> idf
    idf: Vec<f64>,
    /// term id -> (document index, normalized weight)
    postings: Vec<Vec<(u32, f64)>>,
}

impl HadithSearchEngine {
    /// Build an index with the default vectorizer parameters
    pub fn build(corpus: Vec<HadithRecord>) -> Result<Self, SearchError> {
        Self::build_with_config(corpus, NgramConfig::default())
    }

    /// Build an index with explicit vectorizer parameters
    pub fn build_with_config(
        corpus: Vec<HadithRecord>,
        config: NgramConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        if corpus.is_empty() {
            return Err(SearchError::EmptyCorpus);
        }

        let texts: Vec<String> = corpus.iter().map(searchable_text).collect();
        let n_docs = texts.len();

        // Pass 1: document and corpus frequencies
        let mut df: HashMap<String, usize> = HashMap::new();
        let mut cf: HashMap<String, u64> = HashMap::new();
        for text in &texts {
            for (term, count) in char_ngrams(text, config.min_n, config.max_n) {
                *df.entry(term.clone()).or_insert(0) += 1;
                *cf.entry(term).or_insert(0) += u64::from(count);
            }
        }

        let max_doc_count = config.max_df * n_docs as f64;
        let mut kept: Vec<(String, u64)> = cf
            .into_iter()
            .filter(|(term, _)| {
                let d = df.get(term).copied().unwrap_or(0);
                d >= config.min_df && (d as f64) <= max_doc_count
            })
            .collect();

        if kept.is_empty() {
            return Err(SearchError::EmptyVocabulary);
        }

        // Most frequent first; lexicographic among equals
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        kept.truncate(config.max_features);

        let mut terms: Vec<String> = kept.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let vocabulary: HashMap<String, usize> = terms
            .iter()
            .enumerate()
            .map(|(id, term)| (term.clone(), id))
            .collect();

        let idf: Vec<f64> = terms
            .iter()
            .map(|term| {
                let d = df.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs as f64) / (1.0 + d)).ln() + 1.0
            })
            .collect();

        // Pass 2: weighted, normalized document rows
        let mut postings: Vec<Vec<(u32, f64)>> = vec![Vec::new(); terms.len()];
        for (doc, text) in texts.iter().enumerate() {
            let row = weigh(char_ngrams(text, config.min_n, config.max_n), &vocabulary, &idf, &config);
            for (term_id, weight) in row {
                postings[term_id].push((doc as u32, weight));
            }
        }

        tracing::info!(
            documents = n_docs,
            vocabulary = terms.len(),
            "Hadith TF-IDF index built"
        );

        Ok(Self {
            config,
            records: corpus,
            vocabulary,
            idf,
            postings,
        })
    }

    /// Top `k` hadith by cosine similarity, best first.
    ///
    /// Only strictly positive similarities are returned; equal scores keep
    /// corpus order.
    pub fn search(&self, query: &str, k: usize) -> Vec<HadithHit> {
        if k == 0 {
            return vec![];
        }

        let text = normalize_for_index(&normalize_arabic(query));
        let query_row = weigh(
            char_ngrams(&text, self.config.min_n, self.config.max_n),
            &self.vocabulary,
            &self.idf,
            &self.config,
        );
        if query_row.is_empty() {
            return vec![];
        }

        let mut scores = vec![0.0_f64; self.records.len()];
        for (term_id, q_weight) in query_row {
            for &(doc, d_weight) in &self.postings[term_id] {
                scores[doc as usize] += q_weight * d_weight;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ranked.truncate(k);

        ranked
            .into_iter()
            .map(|(doc, score)| {
                let record = &self.records[doc];
                HadithHit {
                    hadith_id: record.hadith_id.clone(),
                    similarity_score: score.min(1.0),
                    title: record.title.clone().unwrap_or_default(),
                    hadith_txt: record.hadith_txt.clone().unwrap_or_default(),
                    matn: record.matn.clone().unwrap_or_default(),
                }
            })
            .collect()
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no documents
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of terms kept after pruning
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }
}

/// Read a hadith corpus: a JSON array of hadith records
pub fn load_corpus(path: impl AsRef<Path>) -> Result<Vec<HadithRecord>, SearchError> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let records: Vec<HadithRecord> = serde_json::from_str(&raw)?;
    tracing::info!(
        path = %path.as_ref().display(),
        records = records.len(),
        "Loaded hadith corpus"
    );
    Ok(records)
}

// ============================================================================
// VECTORIZATION
// ============================================================================

/// Normalized, space-joined text of every present field
fn searchable_text(record: &HadithRecord) -> String {
    let joined = record
        .searchable_parts()
        .map(normalize_arabic)
        .collect::<Vec<_>>()
        .join(" ");
    normalize_for_index(&joined)
}

/// Count every character n-gram of length `min_n..=max_n`
fn char_ngrams(text: &str, min_n: usize, max_n: usize) -> BTreeMap<String, u32> {
    let chars: Vec<char> = text.chars().collect();
    let mut counts = BTreeMap::new();
    for n in min_n..=max_n.min(chars.len()) {
        for window in chars.windows(n) {
            *counts.entry(window.iter().collect::<String>()).or_insert(0) += 1;
        }
    }
    counts
}

/// TF-IDF weights of the in-vocabulary terms, L2-normalized
fn weigh(
    counts: BTreeMap<String, u32>,
    vocabulary: &HashMap<String, usize>,
    idf: &[f64],
    config: &NgramConfig,
) -> Vec<(usize, f64)> {
    let mut row: Vec<(usize, f64)> = counts
        .into_iter()
        .filter_map(|(term, tf)| {
            let id = *vocabulary.get(&term)?;
            let tf = if config.sublinear_tf {
                1.0 + f64::from(tf).ln()
            } else {
                f64::from(tf)
            };
            Some((id, tf * idf[id]))
        })
        .collect();

    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut row {
            *w /= norm;
        }
    }
    row
}

// ============================================================================
// TESTS
// ============================================================================
