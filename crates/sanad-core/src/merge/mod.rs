//! Verse Merging
//!
//! Groups retrieved ayat into maximal runs of consecutive verses per surah.
//!
//! Records are sorted by `(surah, ayah)` before grouping, so the output is in
//! mushaf order rather than the retrieval ranking of the input. Records whose
//! `verse_id` does not parse sort first (key `(0, 0)`, input order kept) and
//! always stand alone.

use serde_json::Map;

use crate::records::{MergedVerseEntry, VerseKey, VerseRecord};

/// Fields the merger owns; stale copies are dropped from carried extras
const MERGE_FIELDS: [&str; 2] = ["merged_count", "original_verses"];

// ============================================================================
// MERGING
// ============================================================================

/// Merge consecutive verses of the same surah.
///
/// A new group starts whenever the surah changes or the ayah number is not
/// exactly one past the previous member. Each group becomes one
/// [`MergedVerseEntry`]: the id becomes a `"S:A1-A2"` range, the score is the
/// group maximum and the texts are space-joined in ayah order.
///
/// ```
/// use sanad_core::merge::merge_verses;
/// use sanad_core::records::VerseRecord;
///
/// let merged = merge_verses(&[
///     VerseRecord::new("2:156", 0.7, "البقرة", "b"),
///     VerseRecord::new("2:155", 0.9, "البقرة", "a"),
/// ]);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].record.verse_id, "2:155-156");
/// ```
pub fn merge_verses(records: &[VerseRecord]) -> Vec<MergedVerseEntry> {
    if records.is_empty() {
        return vec![];
    }

    let mut keyed: Vec<(Option<VerseKey>, &VerseRecord)> =
        records.iter().map(|r| (r.key(), r)).collect();

    // Stable: unparsable ids keep their relative order at the front
    keyed.sort_by_key(|(key, _)| key.map(|k| (k.surah, k.ayah)).unwrap_or((0, 0)));

    let mut groups: Vec<Vec<(Option<VerseKey>, &VerseRecord)>> = Vec::new();
    for item in keyed {
        match groups.last_mut() {
            Some(group) if extends(group.last().and_then(|(k, _)| *k), item.0) => {
                group.push(item)
            }
            _ => groups.push(vec![item]),
        }
    }

    groups.into_iter().map(materialize).collect()
}

/// Whether `next` directly follows `prev` in the same surah
fn extends(prev: Option<VerseKey>, next: Option<VerseKey>) -> bool {
    match (prev, next) {
        (Some(prev), Some(next)) => prev.next() == Some(next),
        _ => false,
    }
}

/// Build the merged entry for one group
fn materialize(group: Vec<(Option<VerseKey>, &VerseRecord)>) -> MergedVerseEntry {
    if let [(_, single)] = group.as_slice() {
        let mut record = (*single).clone();
        for field in MERGE_FIELDS {
            record.extra.remove(field);
        }
        return MergedVerseEntry {
            original_verses: vec![record.verse_id.clone()],
            record,
            merged_count: 1,
        };
    }

    let (first_key, first) = group[0];
    let (last_key, _) = group[group.len() - 1];

    let verse_id = match (first_key, last_key) {
        (Some(a), Some(b)) if a.ayah != b.ayah => format!("{}:{}-{}", a.surah, a.ayah, b.ayah),
        _ => first.verse_id.clone(),
    };

    let texts: Vec<&str> = group
        .iter()
        .filter_map(|(_, r)| r.ayah_text.as_deref())
        .collect();
    let ayah_text = if texts.is_empty() {
        None
    } else {
        Some(texts.join(" "))
    };

    let similarity_score = group
        .iter()
        .map(|(_, r)| r.similarity_score)
        .fold(f64::NEG_INFINITY, f64::max);

    MergedVerseEntry {
        record: VerseRecord {
            verse_id,
            similarity_score,
            surah_name: first.surah_name.clone(),
            ayah_text,
            extra: Map::new(),
        },
        merged_count: group.len(),
        original_verses: group.iter().map(|(_, r)| r.verse_id.clone()).collect(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
