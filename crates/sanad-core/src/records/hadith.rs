//! Hadith records

use serde::{Deserialize, Serialize};

use super::RecordId;

/// A hadith from the reference corpus.
///
/// Only the id is required; text fields are often missing or `null`
/// in the source books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HadithRecord {
    /// Corpus identifier
    #[serde(rename = "hadithID")]
    pub hadith_id: RecordId,
    /// Full narration text (isnad + matn)
    #[serde(rename = "hadithTxt", default)]
    pub hadith_txt: Option<String>,
    /// Matn (body) only
    #[serde(rename = "Matn", default)]
    pub matn: Option<String>,
    /// Chapter or book title
    #[serde(default)]
    pub title: Option<String>,
}

impl HadithRecord {
    /// Non-empty text fields in indexing order: narration, matn, title
    pub fn searchable_parts(&self) -> impl Iterator<Item = &str> {
        [&self.hadith_txt, &self.matn, &self.title]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}
