//! Checkpoint Store
//!
//! Durable `sequence_id -> VerificationResult` mapping used both to resume a
//! run and to reuse earlier per-candidate verdicts.
//!
//! - The canonical file holds the full cumulative result list and is
//!   rewritten atomically (temp file in the same directory, then rename)
//! - Optional forensic copies `{unix_millis}.json` are written after each step
//! - A canonical file that does not parse is reported and never overwritten

use std::collections::HashMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tempfile::NamedTempFile;

use crate::records::{TextField, VerificationResult};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Checkpoint persistence errors
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Existing checkpoint is not a list of verification results
    #[error("Checkpoint {path} does not match the result schema: {reason}")]
    SchemaMismatch { path: PathBuf, reason: String },
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize checkpoint: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CheckpointError>;

// ============================================================================
// FILE HELPERS
// ============================================================================

/// Read a result list from disk
pub fn load_results(path: impl AsRef<Path>) -> Result<Vec<VerificationResult>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| CheckpointError::SchemaMismatch {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Atomically replace `path` with the serialized result list
pub fn write_results(path: impl AsRef<Path>, results: &[VerificationResult]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, results)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| CheckpointError::Io(e.error))?;
    Ok(())
}

// ============================================================================
// STORE
// ============================================================================

/// Results loaded from a previous run plus results produced by this one
#[derive(Debug)]
pub struct CheckpointStore {
    dir: PathBuf,
    canonical_name: String,
    keep_step_snapshots: bool,
    /// Loaded at open, in file order
    prior: Vec<VerificationResult>,
    prior_index: HashMap<String, usize>,
    /// Produced in this run, in processing order
    current: Vec<VerificationResult>,
    current_index: HashMap<String, usize>,
    last_step_millis: i64,
}

impl CheckpointStore {
    /// Open (or start) the checkpoint at `dir/canonical_name`
    pub fn open(
        dir: impl Into<PathBuf>,
        canonical_name: impl Into<String>,
        keep_step_snapshots: bool,
    ) -> Result<Self> {
        let dir = dir.into();
        let canonical_name = canonical_name.into();
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(&canonical_name);
        let prior = if path.exists() {
            let results = load_results(&path)?;
            tracing::info!(path = %path.display(), results = results.len(), "Loaded existing results");
            results
        } else {
            Vec::new()
        };

        // Later duplicates win
        let prior_index = prior
            .iter()
            .enumerate()
            .map(|(i, r)| (r.composite_key(), i))
            .collect();

        Ok(Self {
            dir,
            canonical_name,
            keep_step_snapshots,
            prior,
            prior_index,
            current: Vec::new(),
            current_index: HashMap::new(),
            last_step_millis: 0,
        })
    }

    /// Canonical checkpoint path
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.canonical_name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of results loaded at open
    pub fn prior_len(&self) -> usize {
        self.prior_index.len()
    }

    /// Number of results recorded in this run
    pub fn recorded_len(&self) -> usize {
        self.current.len()
    }

    /// Stored result for a key, preferring this run's
    pub fn get(&self, sequence_id: &str) -> Option<&VerificationResult> {
        self.current_index
            .get(sequence_id)
            .map(|&i| &self.current[i])
            .or_else(|| self.prior_index.get(sequence_id).map(|&i| &self.prior[i]))
    }

    /// Earlier verdict for a candidate text under a key, if one was stored
    pub fn prior_detection(&self, sequence_id: &str, field: TextField, text: &str) -> Option<bool> {
        self.get(sequence_id)?
            .matches
            .iter()
            .filter(|m| m.text(field) == Some(text))
            .find_map(|m| m.detection())
    }

    /// Record (or replace) this run's result for its key
    pub fn record(&mut self, result: VerificationResult) {
        let key = result.composite_key();
        match self.current_index.get(&key) {
            Some(&i) => self.current[i] = result,
            None => {
                self.current_index.insert(key, self.current.len());
                self.current.push(result);
            }
        }
    }

    /// This run's results in processing order, then untouched prior results
    pub fn snapshot(&self) -> Vec<VerificationResult> {
        let mut out = self.current.clone();
        out.extend(
            self.prior
                .iter()
                .enumerate()
                .filter(|(i, r)| {
                    let key = r.composite_key();
                    !self.current_index.contains_key(&key) && self.prior_index.get(&key) == Some(i)
                })
                .map(|(_, r)| r.clone()),
        );
        out
    }

    /// Persist after one query: canonical rewrite plus optional forensic copy
    pub fn save_step(&mut self) -> Result<Option<PathBuf>> {
        let snapshot = self.snapshot();
        write_results(self.path(), &snapshot)?;

        if !self.keep_step_snapshots {
            return Ok(None);
        }

        let mut stamp = Utc::now().timestamp_millis();
        if stamp <= self.last_step_millis {
            stamp = self.last_step_millis + 1;
        }
        self.last_step_millis = stamp;

        let step_path = self.dir.join(format!("{stamp}.json"));
        write_results(&step_path, &snapshot)?;
        tracing::debug!(path = %step_path.display(), results = snapshot.len(), "Step snapshot saved");
        Ok(Some(step_path))
    }

    /// Persist the final full snapshot
    pub fn save_final(&self) -> Result<PathBuf> {
        let path = self.path();
        let snapshot = self.snapshot();
        write_results(&path, &snapshot)?;
        tracing::info!(path = %path.display(), results = snapshot.len(), "Results saved");
        Ok(path)
    }
}

// ============================================================================
// TESTS
// ============================================================================
