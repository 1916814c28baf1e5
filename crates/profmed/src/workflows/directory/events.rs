//! Employee changes published by the employee-management side.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::workflows::ids::{EmployeeId, OrganizationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmployeeEvent {
    Hired {
        employer_id: OrganizationId,
        employee_id: EmployeeId,
    },
    Updated {
        employer_id: OrganizationId,
        employee_id: EmployeeId,
    },
    Deactivated {
        employer_id: OrganizationId,
        employee_id: EmployeeId,
    },
}

impl EmployeeEvent {
    pub fn employer_id(&self) -> OrganizationId {
        match self {
            EmployeeEvent::Hired { employer_id, .. }
            | EmployeeEvent::Updated { employer_id, .. }
            | EmployeeEvent::Deactivated { employer_id, .. } => *employer_id,
        }
    }
}

/// Outbound hook for employee changes.
pub trait EmployeeEventPublisher: Send + Sync {
    fn publish(&self, event: EmployeeEvent);
}

/// Publisher that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl EmployeeEventPublisher for NoopEvents {
    fn publish(&self, _event: EmployeeEvent) {}
}

impl EmployeeEventPublisher for mpsc::UnboundedSender<EmployeeEvent> {
    fn publish(&self, event: EmployeeEvent) {
        if self.send(event).is_err() {
            warn!(?event, "employee event receiver is gone");
        }
    }
}

/// Channel pair feeding a roster refresher.
pub fn employee_event_channel() -> (
    mpsc::UnboundedSender<EmployeeEvent>,
    mpsc::UnboundedReceiver<EmployeeEvent>,
) {
    mpsc::unbounded_channel()
}
