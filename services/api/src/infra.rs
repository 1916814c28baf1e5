use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use profmed::clock::Clock;
use profmed::config::WorkflowSettings;
use profmed::notifications::NotificationSender;
use profmed::store::MemoryStore;
use profmed::workflows::directory::{employee_event_channel, EmployeeEvent};
use profmed::workflows::sample::{sample_ledger, SampleDirectory};
use profmed::workflows::scheduling::RosterRefresher;
use profmed::workflows::{Order131Workflows, WorkflowContext, WorkflowError};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Workflows over the seeded sample directory, plus the refresher fed by their employee events.
pub(crate) struct SeededWorkflows<N> {
    pub(crate) workflows: Arc<Order131Workflows<MemoryStore, N>>,
    pub(crate) directory: SampleDirectory,
    pub(crate) refresher: RosterRefresher<MemoryStore, N>,
    pub(crate) events: UnboundedReceiver<EmployeeEvent>,
}

pub(crate) fn seeded_workflows<N>(
    notifier: Arc<N>,
    settings: WorkflowSettings,
    clock: Arc<dyn Clock>,
) -> Result<SeededWorkflows<N>, WorkflowError>
where
    N: NotificationSender + 'static,
{
    let (ledger, directory) = sample_ledger(clock.now())?;
    let store = Arc::new(MemoryStore::new(ledger));
    let ctx = WorkflowContext::new(store, notifier, settings).with_clock(clock);
    let (publisher, events) = employee_event_channel();
    let workflows = Arc::new(Order131Workflows::new(ctx, Arc::new(publisher)));
    let refresher = RosterRefresher::new(Arc::clone(&workflows.schedule));
    Ok(SeededWorkflows {
        workflows,
        directory,
        refresher,
        events,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
