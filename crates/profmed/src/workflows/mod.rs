pub mod compliance;
pub mod context;
pub mod directory;
pub mod documents;
pub mod error;
pub mod examinations;
pub mod ids;
pub mod sample;
pub mod scheduling;
#[cfg(test)]
pub(crate) mod tests;

use std::sync::Arc;

pub use context::WorkflowContext;
pub use error::WorkflowError;

use crate::notifications::NotificationSender;
use crate::store::WorkflowStore;
use directory::{EmployeeDirectory, EmployeeEventPublisher, PartnershipService};
use documents::DocumentService;
use examinations::ExaminationService;
use scheduling::ScheduleService;

/// Every workflow service wired to one shared context.
pub struct Order131Workflows<S, N> {
    pub employees: EmployeeDirectory<S, N>,
    pub partnerships: PartnershipService<S, N>,
    pub examinations: Arc<ExaminationService<S, N>>,
    pub schedule: Arc<ScheduleService<S, N>>,
    pub documents: DocumentService<S, N>,
}

impl<S, N> Order131Workflows<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(ctx: WorkflowContext<S, N>, events: Arc<dyn EmployeeEventPublisher>) -> Self {
        Self {
            employees: EmployeeDirectory::new(ctx.clone(), events),
            partnerships: PartnershipService::new(ctx.clone()),
            examinations: Arc::new(ExaminationService::new(ctx.clone())),
            schedule: Arc::new(ScheduleService::new(ctx.clone())),
            documents: DocumentService::new(ctx),
        }
    }
}
