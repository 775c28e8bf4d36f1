//! Test Data Factory
//!
//! Provides realistic test data for verification journeys:
//! - Quran and Hadith candidate records in their wire shapes
//! - Query items of every span type
//! - Small canonical corpora for the two retrievers
//! - Pre-built batches for resume and reuse scenarios

use serde_json::json;

use sanad_core::search::{QuranCorpus, QuranVerse};
use sanad_core::{CandidateRecord, HadithRecord, QueryItem, RecordId};

/// Al-Fatiha plus Al-Baqarah 155-157: (surah, ayah, text)
pub const VERSES: [(u32, u32, &str); 10] = [
    (1, 1, "بسم الله الرحمن الرحيم"),
    (1, 2, "الحمد لله رب العالمين"),
    (1, 3, "الرحمن الرحيم"),
    (1, 4, "مالك يوم الدين"),
    (1, 5, "إياك نعبد وإياك نستعين"),
    (1, 6, "اهدنا الصراط المستقيم"),
    (1, 7, "صراط الذين أنعمت عليهم غير المغضوب عليهم ولا الضالين"),
    (
        2,
        155,
        "ولنبلونكم بشيء من الخوف والجوع ونقص من الأموال والأنفس والثمرات وبشر الصابرين",
    ),
    (2, 156, "الذين إذا أصابتهم مصيبة قالوا إنا لله وإنا إليه راجعون"),
    (2, 157, "أولئك عليهم صلوات من ربهم ورحمة وأولئك هم المهتدون"),
];

/// (hadithID, title, text)
pub const HADITHS: [(i64, &str, &str); 5] = [
    (1, "كتاب بدء الوحي", "إنما الأعمال بالنيات وإنما لكل امرئ ما نوى"),
    (2, "كتاب الزهد", "من حسن إسلام المرء تركه ما لا يعنيه"),
    (3, "كتاب الإيمان", "لا يؤمن أحدكم حتى يحب لأخيه ما يحب لنفسه"),
    (4, "كتاب الإيمان", "الدين النصيحة"),
    (5, "كتاب الإيمان", "المسلم من سلم المسلمون من لسانه ويده"),
];

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let item = TestDataFactory::hadith_query(1, "الدين النصيحة", &["...", "الدين النصيحة"]);
/// let corpus = TestDataFactory::quran_corpus();
/// ```
pub struct TestDataFactory;

impl TestDataFactory {
    // ========================================================================
    // CANDIDATES
    // ========================================================================

    /// Hadith candidate as the retriever emits it
    pub fn hadith_candidate(id: i64, text: &str) -> CandidateRecord {
        serde_json::from_value(json!({
            "hadithID": id,
            "similarity_score": 0.5,
            "title": "",
            "hadithTxt": text,
            "Matn": text,
        }))
        .expect("valid hadith candidate")
    }

    /// Verse candidate as the retriever emits it
    pub fn verse_candidate(verse_id: &str, score: f64, text: &str) -> CandidateRecord {
        serde_json::from_value(json!({
            "verse_id": verse_id,
            "similarity_score": score,
            "surah_name": "الفاتحة",
            "ayah_text": text,
        }))
        .expect("valid verse candidate")
    }

    /// Verse candidate for a fixture verse, looked up by id
    pub fn fixture_verse(surah: u32, ayah: u32, score: f64) -> CandidateRecord {
        let text = VERSES
            .iter()
            .find(|(s, a, _)| *s == surah && *a == ayah)
            .map(|(_, _, t)| *t)
            .expect("fixture verse exists");
        Self::verse_candidate(&format!("{surah}:{ayah}"), score, text)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Hadith query over the given candidate texts, ids 1..
    pub fn hadith_query(sequence_id: i64, query: &str, texts: &[&str]) -> QueryItem {
        QueryItem {
            sequence_id: RecordId::Int(sequence_id),
            question_id: RecordId::from(format!("Q{sequence_id}")),
            query_text: query.to_string(),
            span_type: "Hadith".to_string(),
            top_20_match_details: texts
                .iter()
                .enumerate()
                .map(|(i, t)| Self::hadith_candidate(i as i64 + 1, t))
                .collect(),
        }
    }

    /// Verse query of any span type over ready-made candidates
    pub fn verse_query(
        sequence_id: i64,
        span_type: &str,
        query: &str,
        candidates: Vec<CandidateRecord>,
    ) -> QueryItem {
        QueryItem {
            sequence_id: RecordId::Int(sequence_id),
            question_id: RecordId::from(format!("Q{sequence_id}")),
            query_text: query.to_string(),
            span_type: span_type.to_string(),
            top_20_match_details: candidates,
        }
    }

    /// Hadith queries whose candidate lists are the fixture hadiths; query
    /// `i` quotes hadith `i % 5`, so every query has exactly one match.
    pub fn hadith_batch(count: usize) -> Vec<QueryItem> {
        let texts: Vec<&str> = HADITHS.iter().map(|(_, _, t)| *t).collect();
        (0..count)
            .map(|i| {
                let quoted = HADITHS[i % HADITHS.len()].2;
                Self::hadith_query(i as i64 + 1, quoted, &texts)
            })
            .collect()
    }

    // ========================================================================
    // CORPORA
    // ========================================================================

    pub fn quran_corpus() -> QuranCorpus {
        QuranCorpus::from_verses(VERSES.iter().map(|(s, a, t)| QuranVerse {
            surah_id: *s,
            ayah_id: *a,
            ayah_text: t.to_string(),
            surah_name: if *s == 1 { "الفاتحة" } else { "البقرة" }.to_string(),
            surah_name_en: Some(if *s == 1 { "Al-Fatiha" } else { "Al-Baqarah" }.to_string()),
        }))
    }

    pub fn hadith_corpus() -> Vec<HadithRecord> {
        HADITHS
            .iter()
            .map(|(id, title, text)| HadithRecord {
                hadith_id: RecordId::Int(*id),
                hadith_txt: Some(text.to_string()),
                matn: Some(text.to_string()),
                title: Some(title.to_string()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanad_core::TextField;

    #[test]
    fn test_hadith_batch_quotes_one_candidate_each() {
        let batch = TestDataFactory::hadith_batch(7);

        assert_eq!(batch.len(), 7);
        for item in &batch {
            let hits = item
                .top_20_match_details
                .iter()
                .filter(|c| c.text(TextField::HadithTxt) == Some(item.query_text.as_str()))
                .count();
            assert_eq!(hits, 1);
        }
    }

    #[test]
    fn test_fixture_corpora() {
        assert_eq!(TestDataFactory::quran_corpus().len(), VERSES.len());
        assert_eq!(TestDataFactory::hadith_corpus().len(), HADITHS.len());
    }
}
