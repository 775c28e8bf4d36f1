//! Query items, candidates and verification results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RecordError, RecordId};

/// Field added to each evaluated candidate
pub const DETECTION_FIELD: &str = "detection";

// ============================================================================
// SPAN TYPE / CONTENT KIND
// ============================================================================

/// What a query span claims to be.
///
/// | span_type       | content kind |
/// |-----------------|--------------|
/// | `Ayah`          | Verse        |
/// | `WrongAyah`     | Verse        |
/// | `CorrectAyah`   | Verse        |
/// | `Hadith`        | Hadith       |
/// | `WrongHadith`   | Hadith       |
/// | `CorrectHadith` | Hadith       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanType {
    Ayah,
    Hadith,
    WrongAyah,
    CorrectAyah,
    WrongHadith,
    CorrectHadith,
}

impl SpanType {
    /// Content kind for this span type
    pub fn content_kind(&self) -> ContentKind {
        match self {
            SpanType::Ayah | SpanType::WrongAyah | SpanType::CorrectAyah => ContentKind::Verse,
            SpanType::Hadith | SpanType::WrongHadith | SpanType::CorrectHadith => {
                ContentKind::Hadith
            }
        }
    }

    /// Label as written in input files
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanType::Ayah => "Ayah",
            SpanType::Hadith => "Hadith",
            SpanType::WrongAyah => "WrongAyah",
            SpanType::CorrectAyah => "CorrectAyah",
            SpanType::WrongHadith => "WrongHadith",
            SpanType::CorrectHadith => "CorrectHadith",
        }
    }
}

impl std::fmt::Display for SpanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SpanType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ayah" => Ok(SpanType::Ayah),
            "Hadith" => Ok(SpanType::Hadith),
            "WrongAyah" => Ok(SpanType::WrongAyah),
            "CorrectAyah" => Ok(SpanType::CorrectAyah),
            "WrongHadith" => Ok(SpanType::WrongHadith),
            "CorrectHadith" => Ok(SpanType::CorrectHadith),
            other => Err(RecordError::UnknownSpanType(other.to_string())),
        }
    }
}

/// The two kinds of scripture a candidate can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Quranic verse(s)
    Verse,
    /// Hadith narration
    Hadith,
}

impl ContentKind {
    /// Candidate field that carries the text to verify
    pub fn text_field(&self) -> TextField {
        match self {
            ContentKind::Verse => TextField::AyahText,
            ContentKind::Hadith => TextField::HadithTxt,
        }
    }
}

/// Text-bearing candidate field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    /// `ayah_text`
    AyahText,
    /// `hadithTxt`
    HadithTxt,
}

impl TextField {
    /// JSON key
    pub fn key(&self) -> &'static str {
        match self {
            TextField::AyahText => "ayah_text",
            TextField::HadithTxt => "hadithTxt",
        }
    }
}

// ============================================================================
// CANDIDATE RECORD
// ============================================================================

/// A retrieved candidate in its wire form.
///
/// Verse and hadith candidates have different shapes; both are kept as an
/// ordered JSON object so unknown upstream fields survive verification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateRecord(Map<String, Value>);

impl CandidateRecord {
    /// Wrap an existing object
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Serialize any record into candidate form
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, RecordError> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            _ => Err(RecordError::NotAnObject),
        }
    }

    /// Raw field access
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Text of the given field, if present and a string
    pub fn text(&self, field: TextField) -> Option<&str> {
        self.0.get(field.key()).and_then(Value::as_str)
    }

    /// Stored verdict, if this candidate has been evaluated
    pub fn detection(&self) -> Option<bool> {
        self.0.get(DETECTION_FIELD).and_then(Value::as_bool)
    }

    /// Copy annotated with a verdict
    pub fn with_detection(mut self, detection: bool) -> Self {
        self.0.insert(DETECTION_FIELD.to_string(), Value::Bool(detection));
        self
    }

    /// Underlying object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for CandidateRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

// ============================================================================
// QUERY ITEM
// ============================================================================

/// One query span with its retrieved candidates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryItem {
    /// Unique key; the only identity used for caching and resumption
    pub sequence_id: RecordId,
    /// Source question the span was extracted from
    pub question_id: RecordId,
    /// The noisy span text
    pub query_text: String,
    /// Raw span type label
    pub span_type: String,
    /// Ranked candidates
    #[serde(default)]
    pub top_20_match_details: Vec<CandidateRecord>,
}

impl QueryItem {
    /// Cache key for this query
    pub fn composite_key(&self) -> String {
        self.sequence_id.to_string()
    }

    /// Resolve the span type label
    pub fn span_type(&self) -> Result<SpanType, RecordError> {
        self.span_type.parse()
    }
}

// ============================================================================
// VERIFICATION RESULT
// ============================================================================

/// Outcome of verifying one query.
///
/// `matches` is a prefix of the candidate list that ends at the first
/// candidate with `detection = true`, or covers every candidate when
/// nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Question id
    pub id: RecordId,
    /// Query text as given
    pub query: String,
    /// Cache key
    pub sequence_id: RecordId,
    /// Raw span type label
    pub span_type: String,
    /// Evaluated candidates, each with a `detection` field
    pub matches: Vec<CandidateRecord>,
}

impl VerificationResult {
    /// Cache key for this result
    pub fn composite_key(&self) -> String {
        self.sequence_id.to_string()
    }

    /// The matched candidate, if any
    pub fn matched(&self) -> Option<&CandidateRecord> {
        self.matches.iter().find(|m| m.detection() == Some(true))
    }

    /// Whether any candidate matched
    pub fn is_matched(&self) -> bool {
        self.matched().is_some()
    }
}
