//! Sanad End-to-End Test Support
//!
//! Shared harness and fixtures for the journey tests:
//! - Temporary checkpoint directories that clean up after themselves
//! - Realistic Quran and Hadith fixtures
//! - A scripted verifier with call recording and failure injection

pub mod harness;
pub mod mocks;

pub use harness::{CANONICAL_NAME, TestCheckpointManager};
pub use mocks::{MatchRule, ScriptedVerifier, TestDataFactory, VerifierCall};
