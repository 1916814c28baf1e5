use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::service::ScheduleService;
use crate::notifications::NotificationSender;
use crate::store::WorkflowStore;
use crate::workflows::directory::EmployeeEvent;
use crate::workflows::ids::OrganizationId;

/// Consumes employee events and regenerates the affected employers' rosters.
///
/// Events that are already queued when a batch starts are folded together so a burst of
/// hires for one employer costs a single regeneration.
pub struct RosterRefresher<S, N> {
    schedule: Arc<ScheduleService<S, N>>,
}

impl<S, N> RosterRefresher<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(schedule: Arc<ScheduleService<S, N>>) -> Self {
        Self { schedule }
    }

    /// Runs until every sender is dropped. Returns how many rosters were regenerated.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<EmployeeEvent>) -> usize {
        let mut refreshed = 0;
        while let Some(first) = events.recv().await {
            let mut batch: BTreeMap<OrganizationId, EmployeeEvent> = BTreeMap::new();
            batch.insert(first.employer_id(), first);
            while let Ok(next) = events.try_recv() {
                batch.insert(next.employer_id(), next);
            }

            for (employer, event) in batch {
                match self.schedule.handle_employee_event(event) {
                    Ok(document) => {
                        refreshed += 1;
                        debug!(employer = %employer, document = %document.id, "roster refreshed");
                    }
                    Err(err) => warn!(employer = %employer, error = %err, "roster refresh failed"),
                }
            }
        }
        info!(refreshed, "roster refresher stopped");
        refreshed
    }
}
