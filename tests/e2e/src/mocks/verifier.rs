//! Scripted Verifier
//!
//! Deterministic stand-in for the chat model. Verdicts follow a fixed rule,
//! every call is recorded, and failures can be injected for candidates that
//! contain a trigger string.

use std::sync::Mutex;

use async_trait::async_trait;
use sanad_core::{Verdict, Verifier, VerifierError};

/// How the scripted verifier decides
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Match when the candidate contains the query (whitespace-normalized)
    ContainsQuery,
    /// Match when the candidate contains this marker
    Marker(String),
    /// Always answer with something that is neither True nor False
    Unparseable,
}

/// One recorded verifier call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierCall {
    pub query: String,
    pub candidate: String,
}

#[derive(Debug)]
struct FailurePlan {
    trigger: String,
    error: VerifierError,
    /// `None` fails forever
    remaining: Option<usize>,
}

/// Verifier with a fixed decision rule and injectable failures
///
/// # Example
///
/// ```rust,ignore
/// let verifier = Arc::new(
///     ScriptedVerifier::contains_query()
///         .fail_times("", VerifierError::Http("reset".into()), 2),
/// );
/// ```
#[derive(Debug)]
pub struct ScriptedVerifier {
    rule: MatchRule,
    failures: Mutex<Vec<FailurePlan>>,
    calls: Mutex<Vec<VerifierCall>>,
}

impl ScriptedVerifier {
    pub fn new(rule: MatchRule) -> Self {
        Self {
            rule,
            failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn contains_query() -> Self {
        Self::new(MatchRule::ContainsQuery)
    }

    pub fn marker(marker: impl Into<String>) -> Self {
        Self::new(MatchRule::Marker(marker.into()))
    }

    pub fn unparseable() -> Self {
        Self::new(MatchRule::Unparseable)
    }

    /// Fail every call whose candidate contains `trigger`
    pub fn fail_when(self, trigger: impl Into<String>, error: VerifierError) -> Self {
        self.plan(trigger.into(), error, None)
    }

    /// Fail the next `times` calls whose candidate contains `trigger`
    pub fn fail_times(self, trigger: impl Into<String>, error: VerifierError, times: usize) -> Self {
        self.plan(trigger.into(), error, Some(times))
    }

    fn plan(self, trigger: String, error: VerifierError, remaining: Option<usize>) -> Self {
        self.failures
            .lock()
            .expect("failure plan poisoned")
            .push(FailurePlan {
                trigger,
                error,
                remaining,
            });
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<VerifierCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log poisoned").len()
    }

    fn injected_failure(&self, candidate: &str) -> Option<VerifierError> {
        let mut plans = self.failures.lock().expect("failure plan poisoned");
        let plan = plans.iter_mut().find(|p| {
            candidate.contains(&p.trigger) && p.remaining.is_none_or(|n| n > 0)
        })?;
        if let Some(n) = plan.remaining.as_mut() {
            *n -= 1;
        }
        Some(plan.error.clone())
    }
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    async fn verify(&self, query: &str, candidate: &str) -> Result<Verdict, VerifierError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(VerifierCall {
                query: query.to_string(),
                candidate: candidate.to_string(),
            });

        if let Some(error) = self.injected_failure(candidate) {
            return Err(error);
        }

        let reply = match &self.rule {
            MatchRule::ContainsQuery => {
                if squash(candidate).contains(&squash(query)) {
                    "True"
                } else {
                    "False"
                }
            }
            MatchRule::Marker(marker) => {
                if candidate.contains(marker.as_str()) {
                    "True"
                } else {
                    "False"
                }
            }
            MatchRule::Unparseable => "I cannot tell.",
        };
        Ok(Verdict::from_reply(reply))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contains_query_ignores_spacing() {
        let verifier = ScriptedVerifier::contains_query();

        let verdict = verifier.verify("الدين  النصيحة", "قال الدين النصيحة").await;

        assert_eq!(verdict, Ok(Verdict::Match));
        assert_eq!(verifier.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failures_run_out() {
        let verifier = ScriptedVerifier::marker("x").fail_times("", VerifierError::EmptyReply, 1);

        assert_eq!(verifier.verify("q", "x").await, Err(VerifierError::EmptyReply));
        assert_eq!(verifier.verify("q", "x").await, Ok(Verdict::Match));
    }
}
