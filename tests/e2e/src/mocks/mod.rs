//! Test doubles and data

mod fixtures;
mod verifier;

pub use fixtures::TestDataFactory;
pub use verifier::{MatchRule, ScriptedVerifier, VerifierCall};
