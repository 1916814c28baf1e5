use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::WorkflowSettings;
use crate::notifications::{NotificationSender, Outbox};
use crate::store::{Ledger, RepositoryError, WorkflowStore};
use crate::workflows::directory::{OpenAccess, SubscriptionGate};
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::OrganizationId;

/// Collaborators shared by every workflow service.
pub struct WorkflowContext<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    gate: Arc<dyn SubscriptionGate>,
    clock: Arc<dyn Clock>,
    settings: Arc<WorkflowSettings>,
}

impl<S, N> Clone for WorkflowContext<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
            gate: Arc::clone(&self.gate),
            clock: Arc::clone(&self.clock),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<S, N> WorkflowContext<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, settings: WorkflowSettings) -> Self {
        Self {
            store,
            notifier,
            gate: Arc::new(OpenAccess),
            clock: Arc::new(SystemClock),
            settings: Arc::new(settings),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_gate(mut self, gate: Arc<dyn SubscriptionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn ensure_access(&self, organization: OrganizationId) -> Result<(), WorkflowError> {
        if self.gate.has_access(organization) {
            Ok(())
        } else {
            Err(WorkflowError::AccessDenied(format!(
                "organization {organization} has no active subscription"
            )))
        }
    }

    /// Runs a read-only query against the latest committed ledger.
    pub fn read<T, F>(&self, query: F) -> Result<T, WorkflowError>
    where
        F: FnOnce(&Ledger) -> Result<T, WorkflowError>,
    {
        let snapshot = self.store.load()?;
        query(&snapshot.ledger)
    }

    /// Applies `apply` to a fresh snapshot and commits it.
    ///
    /// Lost commit races are retried with a new snapshot up to the configured number of
    /// times. Queued notifications go out only after a successful commit.
    pub(crate) fn transaction<T, F>(
        &self,
        operation: &'static str,
        mut apply: F,
    ) -> Result<T, WorkflowError>
    where
        F: FnMut(&mut Ledger, &mut Outbox) -> Result<T, WorkflowError>,
    {
        let mut attempt = 0;
        loop {
            let snapshot = self.store.load()?;
            let mut ledger = snapshot.ledger;
            let mut outbox = Outbox::default();
            let value = apply(&mut ledger, &mut outbox)?;

            match self.store.commit(snapshot.revision, ledger) {
                Ok(revision) => {
                    let queued = outbox.len();
                    let delivered = outbox.dispatch(self.notifier.as_ref());
                    debug!(operation, revision, queued, delivered, "workflow transaction committed");
                    return Ok(value);
                }
                Err(RepositoryError::Conflict { expected, actual })
                    if attempt < self.settings.transaction_retries =>
                {
                    attempt += 1;
                    warn!(operation, expected, actual, attempt, "commit raced; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
