//! Test harness

mod checkpoint_manager;

pub use checkpoint_manager::{CANONICAL_NAME, TestCheckpointManager};
