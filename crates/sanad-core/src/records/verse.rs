//! Verse records
//!
//! `VerseRecord` is one retrieved ayah; `MergedVerseEntry` is a maximal run
//! of consecutive ayat from one surah as produced by the verse merger.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{CandidateRecord, RecordError};

// ============================================================================
// VERSE KEY
// ============================================================================

/// Position of a single ayah: `surah:ayah`, both 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseKey {
    /// Surah (chapter) number
    pub surah: u32,
    /// Ayah (verse) number within the surah
    pub ayah: u32,
}

impl VerseKey {
    /// Create a key
    pub fn new(surah: u32, ayah: u32) -> Self {
        Self { surah, ayah }
    }

    /// The key directly after this one in the same surah, `None` past `u32::MAX`
    pub fn next(&self) -> Option<Self> {
        self.ayah.checked_add(1).map(|ayah| Self::new(self.surah, ayah))
    }
}

impl std::fmt::Display for VerseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

impl std::str::FromStr for VerseKey {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RecordError::InvalidVerseId(s.to_string());

        let (surah, ayah) = s.split_once(':').ok_or_else(invalid)?;
        let surah: u32 = surah.trim().parse().map_err(|_| invalid())?;
        let ayah: u32 = ayah.trim().parse().map_err(|_| invalid())?;

        if surah == 0 || ayah == 0 {
            return Err(invalid());
        }

        Ok(Self { surah, ayah })
    }
}

// ============================================================================
// VERSE RECORD
// ============================================================================

/// A retrieved ayah candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    /// `"surah:ayah"`; may be unparsable in noisy inputs
    pub verse_id: String,
    /// Retrieval similarity (higher is better)
    #[serde(default)]
    pub similarity_score: f64,
    /// Chapter name
    #[serde(default)]
    pub surah_name: String,
    /// Canonical verse text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ayah_text: Option<String>,
    /// Any further upstream fields, carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerseRecord {
    /// Create a record without extra fields
    pub fn new(
        verse_id: impl Into<String>,
        similarity_score: f64,
        surah_name: impl Into<String>,
        ayah_text: impl Into<String>,
    ) -> Self {
        Self {
            verse_id: verse_id.into(),
            similarity_score,
            surah_name: surah_name.into(),
            ayah_text: Some(ayah_text.into()),
            extra: Map::new(),
        }
    }

    /// Parse the verse id, if it is a single well-formed `surah:ayah`
    pub fn key(&self) -> Option<VerseKey> {
        self.verse_id.parse().ok()
    }

    /// Read a verse record out of a generic candidate
    pub fn from_candidate(candidate: &CandidateRecord) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(candidate.as_map().clone()))
    }
}

// ============================================================================
// MERGED ENTRY
// ============================================================================

/// A run of consecutive ayat from one surah.
///
/// `verse_id` is a range `"S:A1-A2"` only when the run holds more than one
/// distinct ayah; otherwise it is the single original id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedVerseEntry {
    /// Id, text and score of the run
    #[serde(flatten)]
    pub record: VerseRecord,
    /// Number of original records in the run (at least 1)
    pub merged_count: usize,
    /// Original verse ids in ascending ayah order
    pub original_verses: Vec<String>,
}

impl MergedVerseEntry {
    /// Whether this entry spans more than one original record
    pub fn is_merged(&self) -> bool {
        self.merged_count > 1
    }

    /// Convert into the generic candidate wire form
    pub fn to_candidate(&self) -> Result<CandidateRecord, RecordError> {
        CandidateRecord::from_serialize(self)
    }
}
