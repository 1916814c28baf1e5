use std::sync::Mutex;

use tracing::debug;

use super::{Ledger, LedgerSnapshot, RepositoryError, WorkflowStore};

/// Process-local store guarded by a mutex.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<LedgerSnapshot>,
}

impl MemoryStore {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            state: Mutex::new(LedgerSnapshot {
                revision: 0,
                ledger,
            }),
        }
    }

    pub fn revision(&self) -> Result<u64, RepositoryError> {
        Ok(self.lock()?.revision)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LedgerSnapshot>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ledger mutex poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Ledger::default())
    }
}

impl WorkflowStore for MemoryStore {
    fn load(&self) -> Result<LedgerSnapshot, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    fn commit(&self, expected_revision: u64, ledger: Ledger) -> Result<u64, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.revision != expected_revision {
            return Err(RepositoryError::Conflict {
                expected: expected_revision,
                actual: guard.revision,
            });
        }
        guard.revision += 1;
        guard.ledger = ledger;
        debug!(revision = guard.revision, "ledger committed");
        Ok(guard.revision)
    }
}
