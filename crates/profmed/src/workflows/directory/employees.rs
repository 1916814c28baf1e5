use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{Employee, NewEmployee};
use super::events::{EmployeeEvent, EmployeeEventPublisher};
use crate::notifications::NotificationSender;
use crate::store::WorkflowStore;
use crate::workflows::context::WorkflowContext;
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{EmployeeId, ProfessionId};

/// Partial update of an employee record; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdate {
    #[serde(default)]
    pub position: Option<ProfessionId>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Employee registry that announces every change.
pub struct EmployeeDirectory<S, N> {
    ctx: WorkflowContext<S, N>,
    events: Arc<dyn EmployeeEventPublisher>,
}

impl<S, N> EmployeeDirectory<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(ctx: WorkflowContext<S, N>, events: Arc<dyn EmployeeEventPublisher>) -> Self {
        Self { ctx, events }
    }

    pub fn hire(&self, employee: NewEmployee) -> Result<Employee, WorkflowError> {
        let hired = self.ctx.transaction("hire_employee", |ledger, _outbox| {
            let id = ledger.add_employee(employee.clone())?;
            ledger.require_employee(id).cloned()
        })?;
        self.events.publish(EmployeeEvent::Hired {
            employer_id: hired.employer_id,
            employee_id: hired.id,
        });
        Ok(hired)
    }

    pub fn update(&self, id: EmployeeId, update: EmployeeUpdate) -> Result<Employee, WorkflowError> {
        let updated = self.ctx.transaction("update_employee", |ledger, _outbox| {
            if let Some(position) = update.position {
                if ledger.catalog().profession(position).is_none() {
                    return Err(WorkflowError::not_found("profession", position));
                }
            }
            let employee = ledger.employee_mut(id)?;
            if let Some(position) = update.position {
                employee.position = Some(position);
            }
            if let Some(department) = &update.department {
                employee.department = Some(department.clone());
            }
            if let Some(hire_date) = update.hire_date {
                employee.hire_date = Some(hire_date);
            }
            if let Some(notes) = &update.notes {
                employee.notes = Some(notes.clone());
            }
            if let Some(phone) = &update.phone {
                employee.phone = Some(phone.clone());
            }
            Ok(employee.clone())
        })?;
        self.events.publish(EmployeeEvent::Updated {
            employer_id: updated.employer_id,
            employee_id: updated.id,
        });
        Ok(updated)
    }

    pub fn deactivate(&self, id: EmployeeId) -> Result<Employee, WorkflowError> {
        let employee = self.ctx.transaction("deactivate_employee", |ledger, _outbox| {
            ledger.deactivate_employee(id)?;
            ledger.require_employee(id).cloned()
        })?;
        self.events.publish(EmployeeEvent::Deactivated {
            employer_id: employee.employer_id,
            employee_id: employee.id,
        });
        Ok(employee)
    }

    pub fn employee(&self, id: EmployeeId) -> Result<Employee, WorkflowError> {
        self.ctx.read(|ledger| ledger.require_employee(id).cloned())
    }
}
