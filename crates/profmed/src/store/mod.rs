//! Transactional storage for the workflow ledger.
//!
//! Every mutation loads a revisioned snapshot, edits it, and commits it back with the
//! revision it started from. A commit against a stale revision fails with
//! [`RepositoryError::Conflict`] and the caller retries on a fresh snapshot.

mod ledger;
mod memory;

pub use ledger::{Ledger, NewClinic, NewEmployer, NewStaffMember};
pub use memory::MemoryStore;

/// Ledger state together with the revision it was read at.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub revision: u64,
    pub ledger: Ledger,
}

/// Storage abstraction so the workflows can be exercised against any backend.
pub trait WorkflowStore: Send + Sync {
    fn load(&self) -> Result<LedgerSnapshot, RepositoryError>;
    /// Replaces the ledger if nothing was committed since `expected_revision`.
    fn commit(&self, expected_revision: u64, ledger: Ledger) -> Result<u64, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("ledger changed concurrently (expected revision {expected}, found {actual})")]
    Conflict { expected: u64, actual: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
