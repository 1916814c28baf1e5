use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::calendar::{allocate, CalendarPlan, CalendarPlanRequest};
use super::final_act::build_final_act;
use super::roster::{build_roster, UNSPECIFIED_POSITION};
use crate::notifications::NotificationSender;
use crate::store::{Ledger, WorkflowStore};
use crate::workflows::context::WorkflowContext;
use crate::workflows::directory::EmployeeEvent;
use crate::workflows::documents::{
    CalendarPlanContent, Document, DocumentContent, DocumentDraft, DocumentKind, DocumentStatus,
    PlanSlot,
};
use crate::workflows::error::WorkflowError;
use crate::workflows::examinations::{
    create_in_ledger, ExaminationKind, ExaminationRequest, MedicalExamination,
};
use crate::workflows::ids::{EmployeeId, OrganizationId};

/// Hour of day every planned examination is booked at (UTC).
const PLANNED_EXAMINATION_HOUR: u32 = 9;

/// A stored calendar plan plus the examinations it booked in the same commit.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledPlan {
    pub plan: CalendarPlan,
    pub document: Document,
    pub examinations: Vec<MedicalExamination>,
}

/// Rosters, calendar plans and final acts.
pub struct ScheduleService<S, N> {
    ctx: WorkflowContext<S, N>,
}

impl<S, N> ScheduleService<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(ctx: WorkflowContext<S, N>) -> Self {
        Self { ctx }
    }

    /// Regenerates the employer's roster for `year` in place.
    pub fn generate_roster(
        &self,
        employer_id: OrganizationId,
        year: i32,
    ) -> Result<Document, WorkflowError> {
        self.ctx.ensure_access(employer_id)?;
        let now = self.ctx.now();

        let document = self.ctx.transaction("generate_roster", |ledger, _outbox| {
            ledger.require_employer(employer_id)?;
            let content = build_roster(ledger, employer_id, year, now);
            let id = ledger.upsert_yearly_document(
                DocumentDraft {
                    organization_id: employer_id,
                    clinic_id: None,
                    examination_id: None,
                    kind: DocumentKind::Roster,
                    title: format!(
                        "List of persons subject to mandatory medical examination for {year}"
                    ),
                    year,
                    content: DocumentContent::Roster(content),
                    status: DocumentStatus::Draft,
                },
                now,
            )?;
            ledger.require_document(id).cloned()
        })?;

        let due = match &document.content {
            DocumentContent::Roster(content) => content.total_count,
            _ => 0,
        };
        info!(employer = %employer_id, year, due, document = %document.id, "roster generated");
        Ok(document)
    }

    /// Spreads the roster over the clinic's days and books a periodic examination per slot.
    pub fn generate_calendar_plan(
        &self,
        request: CalendarPlanRequest,
    ) -> Result<ScheduledPlan, WorkflowError> {
        self.ctx.ensure_access(request.clinic_id)?;
        if matches!(request.end_date, Some(end) if end < request.start_date) {
            return Err(WorkflowError::Validation(
                "calendar plan end date precedes its start date".to_string(),
            ));
        }
        let now = self.ctx.now();
        let settings = self.ctx.settings();

        let scheduled = self.ctx.transaction("generate_calendar_plan", |ledger, outbox| {
            let employer_id = request.employer_id;
            let clinic_id = request.clinic_id;
            let year = request.year;
            ledger.require_employer(employer_id)?;
            let clinic = ledger.require_clinic(clinic_id)?.clone();

            let roster_ids = roster_order(ledger, employer_id, year)?;
            let slots: Vec<PlanSlot> = roster_ids
                .into_iter()
                .filter_map(|id| ledger.employee(id))
                .filter(|employee| employee.is_active)
                .map(|employee| PlanSlot {
                    employee_id: employee.id,
                    full_name: employee.full_name(),
                    position: employee
                        .position
                        .and_then(|id| ledger.catalog().profession(id))
                        .map(|profession| profession.name.clone())
                        .unwrap_or_else(|| UNSPECIFIED_POSITION.to_string()),
                })
                .collect();

            let capacity = clinic.daily_capacity(settings.default_capacity);
            let allocation = allocate(slots, capacity, request.start_date, request.end_date);

            let document_id = ledger.upsert_yearly_document(
                DocumentDraft {
                    organization_id: employer_id,
                    clinic_id: Some(clinic_id),
                    examination_id: None,
                    kind: DocumentKind::CalendarPlan,
                    title: format!(
                        "Calendar plan of mandatory medical examinations for {year}"
                    ),
                    year,
                    content: DocumentContent::CalendarPlan(CalendarPlanContent {
                        plan_data: allocation.days.clone(),
                        clinic_name: clinic.name.clone(),
                        generated_at: now,
                        overflow_date: allocation.overflow_date,
                    }),
                    status: DocumentStatus::Draft,
                },
                now,
            )?;

            let created_at = ledger
                .calendar_plan(employer_id, year)
                .map_or(now, |existing| existing.created_at);
            let plan = CalendarPlan {
                employer_id,
                clinic_id,
                year,
                plan_data: allocation.days,
                overflow_date: allocation.overflow_date,
                document_id: Some(document_id),
                created_at,
                updated_at: now,
            };
            ledger.put_calendar_plan(plan.clone());

            let mut examinations = Vec::new();
            for (date, day_slots) in &plan.plan_data {
                let scheduled_at = planned_time(*date)?;
                for slot in day_slots {
                    if already_booked(ledger, slot.employee_id, clinic_id, *date) {
                        debug!(employee = %slot.employee_id, %date, "examination already booked");
                        continue;
                    }
                    let examination = create_in_ledger(
                        ledger,
                        settings,
                        &ExaminationRequest {
                            employee_id: slot.employee_id,
                            kind: ExaminationKind::Periodic,
                            clinic_id,
                            scheduled_at,
                            employer_id: Some(employer_id),
                            reason: None,
                        },
                        now,
                    )?;

                    if let Some(phone) = ledger
                        .employee(slot.employee_id)
                        .and_then(|employee| employee.phone.as_deref())
                    {
                        outbox.queue(
                            phone,
                            "examination_scheduled",
                            format!(
                                "You are scheduled for a mandatory medical examination.\nDate: {}\nClinic: {}\nAddress: {}\nYour access code:\n{}\n\nShow this code to the clinic registrar.",
                                date.format("%d.%m.%Y"),
                                clinic.name,
                                clinic.address.as_deref().unwrap_or("ask the clinic"),
                                examination.access_token.as_str()
                            ),
                        );
                    }
                    examinations.push(examination);
                }
            }

            let document = ledger.require_document(document_id)?.clone();
            Ok(ScheduledPlan {
                plan,
                document,
                examinations,
            })
        })?;

        if let Some(overflow) = scheduled.plan.overflow_date {
            warn!(
                employer = %request.employer_id,
                year = request.year,
                date = %overflow,
                "calendar plan ran out of days; remaining employees placed on the end date"
            );
        }
        info!(
            employer = %request.employer_id,
            clinic = %request.clinic_id,
            year = request.year,
            days = scheduled.plan.plan_data.len(),
            employees = scheduled.plan.scheduled_count(),
            booked = scheduled.examinations.len(),
            "calendar plan generated"
        );
        Ok(scheduled)
    }

    /// Three-party act summarizing a year of completed examinations. Every call adds a new document.
    pub fn generate_final_act(
        &self,
        employer_id: OrganizationId,
        clinic_id: OrganizationId,
        year: i32,
    ) -> Result<Document, WorkflowError> {
        self.ctx.ensure_access(clinic_id)?;
        let now = self.ctx.now();

        let document = self.ctx.transaction("generate_final_act", |ledger, _outbox| {
            let employer = ledger.require_employer(employer_id)?;
            let clinic = ledger.require_clinic(clinic_id)?;
            let content = build_final_act(ledger, employer, clinic, year, now);
            let id = ledger.insert_document(
                DocumentDraft {
                    organization_id: employer_id,
                    clinic_id: Some(clinic_id),
                    examination_id: None,
                    kind: DocumentKind::FinalAct,
                    title: format!(
                        "Final act on the results of periodic medical examinations for {year}"
                    ),
                    year,
                    content: DocumentContent::FinalAct(content),
                    status: DocumentStatus::PendingSignature,
                },
                now,
            );
            ledger.require_document(id).cloned()
        })?;

        info!(employer = %employer_id, clinic = %clinic_id, year, document = %document.id, "final act generated");
        Ok(document)
    }

    /// Removes the plan and its document. Booked examinations stay.
    pub fn delete_calendar_plan(
        &self,
        employer_id: OrganizationId,
        year: i32,
    ) -> Result<CalendarPlan, WorkflowError> {
        let removed = self.ctx.transaction("delete_calendar_plan", |ledger, _outbox| {
            let plan = ledger.take_calendar_plan(employer_id, year).ok_or_else(|| {
                WorkflowError::not_found("calendar plan", format!("{employer_id}/{year}"))
            })?;
            if let Some(document_id) = plan.document_id {
                ledger.remove_document(document_id);
            }
            Ok(plan)
        })?;
        info!(employer = %employer_id, year, "calendar plan deleted");
        Ok(removed)
    }

    pub fn calendar_plan(
        &self,
        employer_id: OrganizationId,
        year: i32,
    ) -> Result<CalendarPlan, WorkflowError> {
        self.ctx.read(|ledger| {
            ledger.calendar_plan(employer_id, year).cloned().ok_or_else(|| {
                WorkflowError::not_found("calendar plan", format!("{employer_id}/{year}"))
            })
        })
    }

    /// Brings the current year's roster in line with an employee change.
    pub fn handle_employee_event(&self, event: EmployeeEvent) -> Result<Document, WorkflowError> {
        let year = self.ctx.now().year();
        debug!(?event, year, "refreshing roster after employee change");
        self.generate_roster(event.employer_id(), year)
    }
}

/// Employee ids in roster order. Planning without a roster is refused.
fn roster_order(
    ledger: &Ledger,
    employer_id: OrganizationId,
    year: i32,
) -> Result<Vec<EmployeeId>, WorkflowError> {
    let roster = ledger
        .yearly_document(employer_id, DocumentKind::Roster, year)
        .ok_or_else(|| {
            WorkflowError::Precondition(format!(
                "generate the {year} roster for {employer_id} before its calendar plan"
            ))
        })?;
    match &roster.content {
        DocumentContent::Roster(content) => {
            Ok(content.employees.iter().map(|entry| entry.id).collect())
        }
        _ => Err(WorkflowError::Precondition(format!(
            "document {} is not a roster",
            roster.id
        ))),
    }
}

fn planned_time(date: NaiveDate) -> Result<chrono::DateTime<Utc>, WorkflowError> {
    date.and_hms_opt(PLANNED_EXAMINATION_HOUR, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| WorkflowError::Validation(format!("cannot book examinations on {date}")))
}

fn already_booked(
    ledger: &Ledger,
    employee: EmployeeId,
    clinic: OrganizationId,
    date: NaiveDate,
) -> bool {
    ledger.examinations_of(employee).any(|examination| {
        examination.is_live()
            && examination.clinic_id == clinic
            && examination.scheduled_at.date_naive() == date
    })
}
