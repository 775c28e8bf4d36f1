//! Journey: lexical retrieval feeding verification
//!
//! Candidates come from the real retrievers over the fixture corpora, then
//! go through merging and the scripted verifier.

use std::sync::Arc;

use sanad_core::{
    CandidateRecord, HadithSearchEngine, OrchestratorConfig, QuranSearchEngine, RecordId,
    TextField,
};
use sanad_e2e_tests::{ScriptedVerifier, TestCheckpointManager, TestDataFactory};

#[tokio::test]
async fn test_quote_across_verse_boundary_matches_merged_candidate() {
    let engine = QuranSearchEngine::from_corpus(TestDataFactory::quran_corpus());
    let query = "وبشر الصابرين الذين إذا أصابتهم مصيبة";

    let hits = engine.search(query, 20);
    assert_eq!(hits[0].key().to_string(), "2:156");
    assert!(hits.iter().any(|h| h.key().to_string() == "2:155"));

    let candidates: Vec<CandidateRecord> = hits
        .iter()
        .map(|h| CandidateRecord::from_serialize(&h.to_verse_record()).unwrap())
        .collect();
    let item = TestDataFactory::verse_query(1, "Ayah", query, candidates);

    let checkpoints = TestCheckpointManager::new_temp();
    let verifier = Arc::new(ScriptedVerifier::contains_query());
    let mut orchestrator = checkpoints.orchestrator(verifier.clone(), OrchestratorConfig::default());

    let outcome = orchestrator.process_query(&item).await.unwrap();

    // Neither verse alone contains the quote
    let matched = outcome.result.matched().unwrap();
    assert_eq!(matched.get("verse_id").unwrap(), "2:155-156");
    assert_eq!(matched.get("merged_count").unwrap(), 2);
    assert_eq!(
        matched.get("original_verses").unwrap(),
        &serde_json::json!(["2:155", "2:156"])
    );
    // 1:7 first (sorted), then the merged pair
    assert_eq!(outcome.result.matches.len(), 2);
    assert_eq!(verifier.call_count(), 2);
}

#[tokio::test]
async fn test_hadith_search_result_stops_at_first_match() {
    let engine = HadithSearchEngine::build(TestDataFactory::hadith_corpus()).unwrap();
    let query = "لا يؤمن أحدكم حتى يحب لأخيه";

    let hits = engine.search(query, 5);
    assert_eq!(hits[0].hadith_id, RecordId::Int(3));

    let texts: Vec<String> = hits.iter().map(|h| h.hadith_txt.clone()).collect();
    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let item = TestDataFactory::hadith_query(1, query, &text_refs);

    let checkpoints = TestCheckpointManager::new_temp();
    let verifier = Arc::new(ScriptedVerifier::contains_query());
    let mut orchestrator = checkpoints.orchestrator(verifier.clone(), OrchestratorConfig::default());

    let outcome = orchestrator.process_query(&item).await.unwrap();

    assert!(outcome.result.is_matched());
    assert_eq!(outcome.result.matches.len(), 1);
    assert_eq!(verifier.call_count(), 1);
}

#[tokio::test]
async fn test_hadith_hits_convert_to_candidates() {
    let engine = HadithSearchEngine::build(TestDataFactory::hadith_corpus()).unwrap();

    let hits = engine.search("الدين النصيحة", 3);
    let candidate = hits[0].to_candidate().unwrap();

    assert_eq!(candidate.get("hadithID").unwrap(), 4);
    assert_eq!(candidate.text(TextField::HadithTxt), Some("الدين النصيحة"));
    assert!(candidate.get("similarity_score").unwrap().as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_diacritics_are_stripped_before_verification() {
    let query = "إِنَّمَا الْأَعْمَالُ بِالنِّيَّاتِ";
    let item = TestDataFactory::hadith_query(
        1,
        query,
        &["إِنَّمَا الْأَعْمَالُ بِالنِّيَّاتِ، وَإِنَّمَا لِكُلِّ امْرِئٍ مَا نَوَى"],
    );

    let stripped = TestCheckpointManager::new_temp();
    let verifier = Arc::new(ScriptedVerifier::marker("إنما الأعمال بالنيات"));
    let mut orchestrator = stripped.orchestrator(verifier.clone(), OrchestratorConfig::default());
    let outcome = orchestrator.process_query(&item).await.unwrap();

    assert!(outcome.result.is_matched());
    assert_eq!(verifier.calls()[0].query, "إنما الأعمال بالنيات");
    // Stored candidates keep their original text
    assert_eq!(
        outcome.result.matches[0].text(TextField::HadithTxt),
        item.top_20_match_details[0].text(TextField::HadithTxt)
    );

    let raw = TestCheckpointManager::new_temp();
    let verifier = Arc::new(ScriptedVerifier::marker("إنما الأعمال بالنيات"));
    let config = OrchestratorConfig {
        remove_diacritics: false,
        ..OrchestratorConfig::default()
    };
    let mut orchestrator = raw.orchestrator(verifier.clone(), config);
    let outcome = orchestrator.process_query(&item).await.unwrap();

    assert!(!outcome.result.is_matched());
    assert_eq!(verifier.calls()[0].query, query);
}
