//! Quran Search
//!
//! Ranks verses by how many distinct query words they contain (coverage) and
//! how tightly those words cluster (proximity):
//!
//! `score = coverage * 1000 - proximity`
//!
//! Coverage dominates; proximity only orders verses of equal coverage. The
//! word index is a locator only. Returned text always comes from the
//! canonical corpus, and verses it cannot resolve are dropped.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::SearchError;
use crate::records::{VerseKey, VerseRecord};
use crate::text::tokenize;

/// Weight of full coverage in the combined score
const COVERAGE_WEIGHT: f64 = 1000.0;

// ============================================================================
// CANONICAL CORPUS
// ============================================================================

/// One canonical verse as stored in the corpus file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuranVerse {
    pub surah_id: u32,
    pub ayah_id: u32,
    pub ayah_text: String,
    pub surah_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surah_name_en: Option<String>,
}

impl QuranVerse {
    /// Position of this verse
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.surah_id, self.ayah_id)
    }
}

/// Canonical verse text and surah names, keyed by position.
///
/// This is the only source of verse text for search results.
#[derive(Debug, Clone, Default)]
pub struct QuranCorpus {
    verses: BTreeMap<VerseKey, QuranVerse>,
    surah_names_en: HashMap<u32, String>,
}

impl QuranCorpus {
    /// Build from verse entries; a repeated key keeps the last entry
    pub fn from_verses(verses: impl IntoIterator<Item = QuranVerse>) -> Self {
        let mut corpus = Self::default();
        for verse in verses {
            if let Some(name) = verse.surah_name_en.as_deref().filter(|n| !n.is_empty()) {
                corpus
                    .surah_names_en
                    .entry(verse.surah_id)
                    .or_insert_with(|| name.to_string());
            }
            corpus.verses.insert(verse.key(), verse);
        }
        corpus
    }

    /// Load a JSON array of verse entries
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let verses: Vec<QuranVerse> = serde_json::from_str(&raw)?;
        let corpus = Self::from_verses(verses);
        tracing::info!(
            path = %path.as_ref().display(),
            verses = corpus.len(),
            "Loaded Quran corpus"
        );
        Ok(corpus)
    }

    /// Canonical entry for a position
    pub fn get(&self, key: &VerseKey) -> Option<&QuranVerse> {
        self.verses.get(key)
    }

    /// English surah name, empty when unknown
    pub fn surah_name_en(&self, surah: u32) -> &str {
        self.surah_names_en.get(&surah).map(String::as_str).unwrap_or("")
    }

    /// All verses in mushaf order
    pub fn iter(&self) -> impl Iterator<Item = &QuranVerse> {
        self.verses.values()
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }
}

// ============================================================================
// WORD INDEX
// ============================================================================

/// Exact-token locator: normalized word -> every `(verse, position)` it occurs at
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    occurrences: HashMap<String, Vec<(VerseKey, usize)>>,
}

impl WordIndex {
    /// Index any sequence of `(position, text)` pairs
    pub fn build<'a>(verses: impl IntoIterator<Item = (VerseKey, &'a str)>) -> Self {
        let mut occurrences: HashMap<String, Vec<(VerseKey, usize)>> = HashMap::new();
        for (key, text) in verses {
            for (position, word) in tokenize(text).into_iter().enumerate() {
                occurrences.entry(word).or_default().push((key, position));
            }
        }
        Self { occurrences }
    }

    /// Index the canonical text of a corpus
    pub fn from_corpus(corpus: &QuranCorpus) -> Self {
        Self::build(corpus.iter().map(|v| (v.key(), v.ayah_text.as_str())))
    }

    /// Occurrences of an already-normalized word
    pub fn occurrences(&self, word: &str) -> &[(VerseKey, usize)] {
        self.occurrences.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct indexed words
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

// ============================================================================
// SCORING
// ============================================================================

/// Fraction of query words found: `distinct matched word indices / total`
pub fn coverage_score(matched_word_indices: usize, total_query_words: usize) -> f64 {
    if total_query_words == 0 {
        return 0.0;
    }
    matched_word_indices as f64 / total_query_words as f64
}

/// Mean gap between consecutive sorted positions; 0 for one match or none.
///
/// Lower means the matched words sit closer together.
pub fn proximity_score(positions: &[usize]) -> f64 {
    if positions.len() <= 1 {
        return 0.0;
    }
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    let total: usize = sorted.windows(2).map(|w| w[1] - w[0]).sum();
    total as f64 / (sorted.len() - 1) as f64
}

/// A ranked verse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseHit {
    pub surah: u32,
    pub ayah: u32,
    /// Canonical text from the corpus
    pub text: String,
    pub surah_name: String,
    pub surah_name_en: String,
    pub score: f64,
    pub coverage: f64,
    pub proximity: f64,
    /// Distinct `(word index, position)` matches in this verse
    pub matched_words_count: usize,
    pub total_query_words: usize,
}

impl VerseHit {
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.surah, self.ayah)
    }

    /// Candidate form, scored by the combined score
    pub fn to_verse_record(&self) -> VerseRecord {
        VerseRecord::new(
            self.key().to_string(),
            self.score,
            self.surah_name.clone(),
            self.text.clone(),
        )
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Coverage + proximity search over the canonical corpus
#[derive(Debug, Clone)]
pub struct QuranSearchEngine {
    corpus: QuranCorpus,
    index: WordIndex,
}

impl QuranSearchEngine {
    /// Pair a canonical corpus with an independently built locator
    pub fn new(corpus: QuranCorpus, index: WordIndex) -> Self {
        Self { corpus, index }
    }

    /// Index the corpus' own canonical text
    pub fn from_corpus(corpus: QuranCorpus) -> Self {
        let index = WordIndex::from_corpus(&corpus);
        tracing::info!(verses = corpus.len(), words = index.len(), "Quran word index built");
        Self { corpus, index }
    }

    pub fn corpus(&self) -> &QuranCorpus {
        &self.corpus
    }

    /// Top `k` verses, best first; equal scores in ascending verse order
    pub fn search(&self, query: &str, k: usize) -> Vec<VerseHit> {
        let words = tokenize(query);
        if words.is_empty() || k == 0 {
            return vec![];
        }

        let mut matches: BTreeMap<VerseKey, BTreeSet<(usize, usize)>> = BTreeMap::new();
        for (word_index, word) in words.iter().enumerate() {
            for &(key, position) in self.index.occurrences(word) {
                matches.entry(key).or_default().insert((word_index, position));
            }
        }

        let total = words.len();
        let mut hits: Vec<VerseHit> = matches
            .into_iter()
            .filter_map(|(key, found)| self.rank_verse(key, &found, total))
            .collect();

        // Stable over ascending keys from the BTreeMap
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(k);
        hits
    }

    fn rank_verse(
        &self,
        key: VerseKey,
        found: &BTreeSet<(usize, usize)>,
        total_query_words: usize,
    ) -> Option<VerseHit> {
        let Some(verse) = self.corpus.get(&key).filter(|v| !v.ayah_text.is_empty()) else {
            tracing::debug!(verse = %key, "Dropping match with no canonical text");
            return None;
        };

        let distinct_words: BTreeSet<usize> = found.iter().map(|(w, _)| *w).collect();
        let positions: Vec<usize> = found.iter().map(|(_, p)| *p).collect();

        let coverage = coverage_score(distinct_words.len(), total_query_words);
        let proximity = proximity_score(&positions);

        Some(VerseHit {
            surah: key.surah,
            ayah: key.ayah,
            text: verse.ayah_text.clone(),
            surah_name: verse.surah_name.clone(),
            surah_name_en: self.corpus.surah_name_en(key.surah).to_string(),
            score: coverage * COVERAGE_WEIGHT - proximity,
            coverage,
            proximity,
            matched_words_count: found.len(),
            total_query_words,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
