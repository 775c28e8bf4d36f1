//! Journey: verifier failures and bad input during a run
//!
//! Transient failures are retried, exhausted retries and malformed queries
//! are recorded without stopping the run, and fatal errors stop it with the
//! progress saved.

use std::sync::Arc;
use std::time::Duration;

use sanad_core::{
    OrchestratorConfig, RetryPolicy, RetryingVerifier, RunError, TextField, VerifierError,
};
use sanad_e2e_tests::{ScriptedVerifier, TestCheckpointManager, TestDataFactory};

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(10),
        timeout: Duration::from_secs(1),
    }
}

fn hadith_text(index: usize) -> String {
    TestDataFactory::hadith_corpus()[index]
        .hadith_txt
        .clone()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried() {
    let checkpoints = TestCheckpointManager::new_temp();
    let inner = Arc::new(
        ScriptedVerifier::contains_query().fail_times("", VerifierError::Http("reset".into()), 2),
    );
    let verifier = RetryingVerifier::new(inner.clone(), fast_retry(3));
    let mut orchestrator = checkpoints.orchestrator(verifier, OrchestratorConfig::default());

    let report = orchestrator
        .run(TestDataFactory::hadith_batch(1))
        .await
        .unwrap();

    assert!(report.failures.is_empty());
    assert_eq!(report.matched, 1);
    // One logical call, three attempts
    assert_eq!(report.verifier_calls, 1);
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_skip_the_query_and_continue() {
    let checkpoints = TestCheckpointManager::new_temp();
    let inner = Arc::new(ScriptedVerifier::contains_query().fail_when(
        hadith_text(2),
        VerifierError::Status {
            status: 503,
            body: "overloaded".into(),
        },
    ));
    let verifier = RetryingVerifier::new(inner.clone(), fast_retry(2));
    let mut orchestrator = checkpoints.orchestrator(verifier, OrchestratorConfig::default());

    // Query 3 is the only one that reaches the third hadith
    let texts: Vec<String> = (0..5).map(hadith_text).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let mut queries = TestDataFactory::hadith_batch(3);
    queries.push(TestDataFactory::hadith_query(4, &texts[0], &refs));

    let report = orchestrator.run(queries).await.unwrap();

    assert_eq!(report.processed, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].sequence_id, "3");
    assert!(report.failures[0].error.contains("503"));
    assert_eq!(checkpoints.keys(), vec!["1", "2", "4"]);

    let attempts_on_third = inner
        .calls()
        .iter()
        .filter(|c| c.candidate == texts[2])
        .count();
    assert_eq!(attempts_on_third, 2);
}

#[tokio::test]
async fn test_unknown_span_type_is_reported_without_calls() {
    let checkpoints = TestCheckpointManager::new_temp();
    let verifier = Arc::new(ScriptedVerifier::contains_query());
    let mut orchestrator = checkpoints.orchestrator(verifier.clone(), OrchestratorConfig::default());

    let mut queries = TestDataFactory::hadith_batch(2);
    queries[0].span_type = "Poem".into();

    let report = orchestrator.run(queries).await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].sequence_id, "1");
    assert!(report.failures[0].error.contains("Poem"));
    assert_eq!(checkpoints.keys(), vec!["2"]);
    // Query 2 stops at its second candidate
    assert_eq!(verifier.call_count(), 2);
}

#[tokio::test]
async fn test_unparseable_replies_count_as_no_match() {
    let checkpoints = TestCheckpointManager::new_temp();
    let mut orchestrator = checkpoints.orchestrator(
        ScriptedVerifier::unparseable(),
        OrchestratorConfig::default(),
    );

    let report = orchestrator
        .run(TestDataFactory::hadith_batch(1))
        .await
        .unwrap();

    assert_eq!(report.matched, 0);
    let results = checkpoints.load();
    assert_eq!(results[0].matches.len(), 5);
    assert!(results[0].matches.iter().all(|m| m.detection() == Some(false)));
    assert!(
        results[0]
            .matches
            .iter()
            .all(|m| m.text(TextField::HadithTxt).is_some())
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_credentials_stop_the_run_immediately() {
    let checkpoints = TestCheckpointManager::new_temp();
    let inner = Arc::new(ScriptedVerifier::contains_query().fail_when(
        "",
        VerifierError::Status {
            status: 401,
            body: "invalid api key".into(),
        },
    ));
    let verifier = RetryingVerifier::new(inner.clone(), fast_retry(3));
    let mut orchestrator = checkpoints.orchestrator(verifier, OrchestratorConfig::default());

    let err = orchestrator
        .run(TestDataFactory::hadith_batch(3))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Fatal { ref sequence_id, .. } if sequence_id == "1"));
    assert_eq!(inner.call_count(), 1);
    assert!(checkpoints.exists());
    assert!(checkpoints.load().is_empty());
}
