//! Test Checkpoint Manager
//!
//! Provides isolated checkpoint directories for testing:
//! - Temporary directories that are automatically cleaned up
//! - Pre-seeded checkpoints from earlier "runs"
//! - Raw access to the canonical file and forensic step copies

use std::path::{Path, PathBuf};

use sanad_core::checkpoint::{load_results, write_results};
use sanad_core::{
    CheckpointStore, OrchestratorConfig, VerificationOrchestrator, VerificationResult, Verifier,
};
use tempfile::TempDir;

/// Canonical file name used by the harness
pub const CANONICAL_NAME: &str = "final.json";

/// Manager for test checkpoint directories
///
/// Each manager owns one temporary directory. Opening several stores against
/// the same manager simulates consecutive runs of the pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let checkpoints = TestCheckpointManager::new_temp();
///
/// let mut orchestrator = checkpoints.orchestrator(verifier, OrchestratorConfig::default());
/// orchestrator.run(queries).await?;
///
/// assert_eq!(checkpoints.load().len(), 3);
/// ```
pub struct TestCheckpointManager {
    /// Kept alive so the directory outlives every store
    _temp_dir: TempDir,
    dir: PathBuf,
}

impl TestCheckpointManager {
    /// Create an empty checkpoint directory
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("openai_test_model_with_diacritic");

        Self {
            _temp_dir: temp_dir,
            dir,
        }
    }

    /// Create a directory whose checkpoint already holds `results`
    pub fn with_results(results: &[VerificationResult]) -> Self {
        let manager = Self::new_temp();
        manager.seed(results);
        manager
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Canonical checkpoint path
    pub fn path(&self) -> PathBuf {
        self.dir.join(CANONICAL_NAME)
    }

    // ========================================================================
    // STORES
    // ========================================================================

    /// Open a store as a new run would
    pub fn open_store(&self, keep_step_snapshots: bool) -> CheckpointStore {
        CheckpointStore::open(&self.dir, CANONICAL_NAME, keep_step_snapshots)
            .expect("Failed to open checkpoint store")
    }

    /// Orchestrator over a freshly opened store
    pub fn orchestrator<V: Verifier>(
        &self,
        verifier: V,
        config: OrchestratorConfig,
    ) -> VerificationOrchestrator<V> {
        VerificationOrchestrator::new(verifier, self.open_store(false), config)
    }

    /// Orchestrator that also writes a forensic copy after every query
    pub fn orchestrator_with_snapshots<V: Verifier>(
        &self,
        verifier: V,
        config: OrchestratorConfig,
    ) -> VerificationOrchestrator<V> {
        VerificationOrchestrator::new(verifier, self.open_store(true), config)
    }

    // ========================================================================
    // FILE ACCESS
    // ========================================================================

    /// Write a checkpoint as if an earlier run had produced it
    pub fn seed(&self, results: &[VerificationResult]) {
        std::fs::create_dir_all(&self.dir).expect("Failed to create checkpoint dir");
        write_results(self.path(), results).expect("Failed to seed checkpoint");
    }

    /// Overwrite the canonical file with arbitrary contents
    pub fn corrupt(&self, contents: &str) {
        std::fs::create_dir_all(&self.dir).expect("Failed to create checkpoint dir");
        std::fs::write(self.path(), contents).expect("Failed to write checkpoint");
    }

    /// Whether a canonical file exists
    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Parsed canonical results
    pub fn load(&self) -> Vec<VerificationResult> {
        load_results(self.path()).expect("Failed to load checkpoint")
    }

    /// Canonical file bytes, for byte-identity checks
    pub fn raw(&self) -> Vec<u8> {
        std::fs::read(self.path()).expect("Failed to read checkpoint")
    }

    /// Composite keys in file order
    pub fn keys(&self) -> Vec<String> {
        self.load()
            .iter()
            .map(VerificationResult::composite_key)
            .collect()
    }

    /// Forensic step copies, oldest first
    pub fn step_snapshots(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut stamped: Vec<(i64, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter_map(|p| {
                let stamp = p.file_stem()?.to_str()?.parse::<i64>().ok()?;
                Some((stamp, p))
            })
            .collect();
        stamped.sort_by_key(|(stamp, _)| *stamp);
        stamped.into_iter().map(|(_, p)| p).collect()
    }

    /// Files left in the directory, by name
    pub fn file_names(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_manager_starts_empty() {
        let manager = TestCheckpointManager::new_temp();

        assert!(!manager.exists());
        assert!(manager.step_snapshots().is_empty());
        assert_eq!(manager.open_store(false).prior_len(), 0);
    }

    #[test]
    fn test_seeded_manager_is_loaded_by_store() {
        let manager = TestCheckpointManager::with_results(&[]);

        assert!(manager.exists());
        assert!(manager.load().is_empty());
        assert_eq!(manager.file_names(), vec![CANONICAL_NAME.to_string()]);
    }
}
