use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    DoctorExamination, DoctorFindings, ExaminationKind, ExaminationProgress, ExaminationRequest,
    ExaminationResult, ExaminationStatus, LaboratoryResult, LaboratoryResultInput,
    MedicalExamination,
};
use super::routing::build_route;
use crate::config::WorkflowSettings;
use crate::notifications::NotificationSender;
use crate::store::{Ledger, WorkflowStore};
use crate::workflows::compliance::{
    check_contraindications, required_doctors_for, ContraindicationMatch, HarmfulFactor,
};
use crate::workflows::context::WorkflowContext;
use crate::workflows::directory::StaffRole;
use crate::workflows::documents::{certificate, Document};
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{DoctorExaminationId, ExaminationId, LabResultId, MemberId};

/// Findings as stored plus every contraindication hit they triggered.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedFindings {
    pub doctor_examination: DoctorExamination,
    pub flagged: Vec<ContraindicationMatch>,
}

/// What the registrar sees after scanning an access token. Carries no findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontDeskView {
    pub examination_id: ExaminationId,
    pub employee_name: String,
    pub clinic_name: String,
    pub kind: ExaminationKind,
    pub status: ExaminationStatus,
    pub scheduled_at: DateTime<Utc>,
    pub progress: ExaminationProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletedExamination {
    pub examination: MedicalExamination,
    pub certificate: Document,
}

/// Schedules an examination with its route inside an open transaction.
pub(crate) fn create_in_ledger(
    ledger: &mut Ledger,
    settings: &WorkflowSettings,
    request: &ExaminationRequest,
    now: DateTime<Utc>,
) -> Result<MedicalExamination, WorkflowError> {
    let employee = ledger.require_employee(request.employee_id)?;
    if !employee.is_active {
        return Err(WorkflowError::Validation(format!(
            "employee {} is no longer active",
            employee.id
        )));
    }
    let employer_id = request.employer_id.unwrap_or(employee.employer_id);
    if employer_id != employee.employer_id {
        return Err(WorkflowError::Validation(format!(
            "employee {} does not work for {}",
            employee.id, employer_id
        )));
    }
    ledger.require_employer(employer_id)?;
    ledger.require_clinic(request.clinic_id)?;

    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(str::to_string);
    if request.kind == ExaminationKind::Extraordinary && reason.is_none() {
        return Err(WorkflowError::Validation(
            "extraordinary examinations need a reason".to_string(),
        ));
    }

    let factors = employee
        .position
        .map(|position| ledger.catalog().active_factors_for_profession(position))
        .unwrap_or_default();
    let specializations = required_doctors_for(factors);
    let staff = ledger.active_staff(request.clinic_id);
    let route = build_route(&staff, &specializations, settings.final_reviewer_policy);
    if route.final_reviewer().is_none() {
        warn!(clinic = %request.clinic_id, "clinic has no final reviewer for the route");
    }

    let employee_id = employee.id;
    let access_token = ledger.fresh_access_token();
    let id = ExaminationId(ledger.allocate_id());
    let examination = MedicalExamination::scheduled(
        id,
        employee_id,
        request.clinic_id,
        employer_id,
        request.kind,
        request.scheduled_at,
        reason,
        access_token,
        route,
        now,
    );
    ledger.insert_examination(examination.clone())?;
    Ok(examination)
}

/// Examination state machine: scheduling, findings, completion.
pub struct ExaminationService<S, N> {
    ctx: WorkflowContext<S, N>,
}

impl<S, N> ExaminationService<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(ctx: WorkflowContext<S, N>) -> Self {
        Self { ctx }
    }

    pub fn create_examination(
        &self,
        request: ExaminationRequest,
    ) -> Result<MedicalExamination, WorkflowError> {
        self.ctx.ensure_access(request.clinic_id)?;
        let now = self.ctx.now();
        let examination = self.ctx.transaction("create_examination", |ledger, _outbox| {
            create_in_ledger(ledger, self.ctx.settings(), &request, now)
        })?;

        info!(
            examination = %examination.id,
            employee = %examination.employee_id,
            kind = examination.kind.label(),
            route = examination.route.len(),
            "examination scheduled"
        );
        Ok(examination)
    }

    pub fn start_examination(&self, id: ExaminationId) -> Result<MedicalExamination, WorkflowError> {
        self.ctx.transaction("start_examination", |ledger, _outbox| {
            let examination = ledger.examination_mut(id)?;
            examination.start()?;
            Ok(examination.clone())
        })
    }

    /// Stores one doctor's conclusion and flags matching contraindications. Status is unchanged.
    pub fn add_doctor_examination(
        &self,
        id: ExaminationId,
        findings: DoctorFindings,
    ) -> Result<RecordedFindings, WorkflowError> {
        let now = self.ctx.now();
        let matching = self.ctx.settings().contraindication_matching;

        let recorded = self.ctx.transaction("add_doctor_examination", |ledger, _outbox| {
            let examination = ledger.require_examination(id)?;
            examination.ensure_open("record findings for")?;

            let doctor = ledger.require_member(findings.doctor_id)?;
            let is_clinician = matches!(doctor.role, StaffRole::Doctor | StaffRole::FinalReviewer);
            if doctor.organization_id != examination.clinic_id || !doctor.is_active || !is_clinician {
                return Err(WorkflowError::Validation(format!(
                    "{} is not an active doctor of the examining clinic",
                    doctor.id
                )));
            }
            if ledger.catalog().factor(findings.factor_id).is_none() {
                return Err(WorkflowError::not_found("harmful factor", findings.factor_id));
            }
            if examination.has_findings_from(findings.doctor_id, findings.factor_id) {
                return Err(WorkflowError::Conflict(format!(
                    "{} already recorded findings for {} on {}",
                    findings.doctor_id, findings.factor_id, id
                )));
            }

            let flagged = check_contraindications(
                ledger.catalog(),
                findings.factor_id,
                &findings.findings,
                &findings.icd_codes,
                matching,
            );
            let record = DoctorExamination {
                id: DoctorExaminationId(ledger.allocate_id()),
                doctor_id: findings.doctor_id,
                factor_id: findings.factor_id,
                result: findings.result,
                findings: findings.findings.trim().to_string(),
                recommendations: findings.recommendations.trim().to_string(),
                icd_codes: findings.icd_codes.clone(),
                contraindications: flagged
                    .iter()
                    .map(|hit| hit.contraindication_id)
                    .collect(),
                examined_at: now,
            };
            ledger
                .examination_mut(id)?
                .doctor_examinations
                .push(record.clone());

            Ok(RecordedFindings {
                doctor_examination: record,
                flagged,
            })
        })?;

        if !recorded.flagged.is_empty() {
            warn!(
                examination = %id,
                doctor = %recorded.doctor_examination.doctor_id,
                hits = recorded.flagged.len(),
                "contraindications flagged"
            );
        }
        Ok(recorded)
    }

    pub fn record_laboratory_result(
        &self,
        id: ExaminationId,
        input: LaboratoryResultInput,
    ) -> Result<LaboratoryResult, WorkflowError> {
        if input.test_name.trim().is_empty() || input.value.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "laboratory results need a test name and a value".to_string(),
            ));
        }
        let now = self.ctx.now();
        self.ctx.transaction("record_laboratory_result", |ledger, _outbox| {
            ledger
                .require_examination(id)?
                .ensure_open("record laboratory results for")?;
            let result = LaboratoryResult {
                id: LabResultId(ledger.allocate_id()),
                test_name: input.test_name.trim().to_string(),
                test_code: input.test_code.clone(),
                value: input.value.trim().to_string(),
                unit: input.unit.clone(),
                reference_range: input.reference_range.clone(),
                is_normal: input.is_normal,
                recorded_at: now,
            };
            ledger
                .examination_mut(id)?
                .laboratory_results
                .push(result.clone());
            Ok(result)
        })
    }

    /// Renders the final disposition and issues the medical certificate in the same commit.
    pub fn complete_examination(
        &self,
        id: ExaminationId,
        final_result: ExaminationResult,
        final_reviewer: MemberId,
    ) -> Result<CompletedExamination, WorkflowError> {
        let now = self.ctx.now();
        let policy = self.ctx.settings().final_reviewer_policy;

        let completed = self.ctx.transaction("complete_examination", |ledger, outbox| {
            let examination = ledger.require_examination(id)?;
            examination.ensure_open("complete")?;
            let reviewer = ledger.require_member(final_reviewer)?;
            if reviewer.organization_id != examination.clinic_id || !policy.permits(reviewer) {
                return Err(WorkflowError::Validation(format!(
                    "{} may not render final dispositions at this clinic",
                    reviewer.id
                )));
            }

            ledger
                .examination_mut(id)?
                .complete(final_result, final_reviewer, now)?;
            let certificate_id = certificate::issue_in_ledger(ledger, id, now)?;

            let examination = ledger.require_examination(id)?.clone();
            let certificate = ledger.require_document(certificate_id)?.clone();
            let employee = ledger.require_employee(examination.employee_id)?;
            let clinic = ledger.require_clinic(examination.clinic_id)?;
            let employer = ledger.require_employer(examination.employer_id)?;
            outbox.queue(
                &employer.owner.phone,
                "examination_completed",
                format!(
                    "Examination of employee {} is complete.\nResult: {}\nClinic: {}\nMedical certificate 075/u is available in the system.",
                    employee.full_name(),
                    final_result.display(),
                    clinic.name
                ),
            );

            Ok(CompletedExamination {
                examination,
                certificate,
            })
        })?;

        info!(
            examination = %id,
            result = final_result.label(),
            certificate = %completed.certificate.id,
            "examination completed"
        );
        Ok(completed)
    }

    pub fn cancel_examination(
        &self,
        id: ExaminationId,
        reason: &str,
    ) -> Result<MedicalExamination, WorkflowError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::Validation(
                "cancellation needs a reason".to_string(),
            ));
        }
        let cancelled = self.ctx.transaction("cancel_examination", |ledger, _outbox| {
            let examination = ledger.examination_mut(id)?;
            examination.cancel(reason.to_string())?;
            Ok(examination.clone())
        })?;
        info!(examination = %id, "examination cancelled");
        Ok(cancelled)
    }

    pub fn get_examination_progress(
        &self,
        id: ExaminationId,
    ) -> Result<ExaminationProgress, WorkflowError> {
        self.ctx
            .read(|ledger| Ok(ledger.require_examination(id)?.progress()))
    }

    pub fn examination(&self, id: ExaminationId) -> Result<MedicalExamination, WorkflowError> {
        self.ctx.read(|ledger| ledger.require_examination(id).cloned())
    }

    /// Catalog factor by its Order 131 code, for doctors picking what their findings cover.
    pub fn harmful_factor(&self, code: &str) -> Result<HarmfulFactor, WorkflowError> {
        let code = code.trim();
        self.ctx.read(|ledger| {
            ledger
                .catalog()
                .factor_by_code(code)
                .cloned()
                .ok_or_else(|| WorkflowError::not_found("harmful factor", code))
        })
    }

    /// Front-desk lookup by the code the employee was sent.
    pub fn find_by_access_token(&self, token: &str) -> Result<MedicalExamination, WorkflowError> {
        let token = token.trim();
        self.ctx.read(|ledger| {
            ledger
                .examination_by_token(token)
                .cloned()
                .ok_or_else(|| WorkflowError::not_found("examination", "with this access token"))
        })
    }

    pub fn front_desk_view(&self, token: &str) -> Result<FrontDeskView, WorkflowError> {
        let examination = self.find_by_access_token(token)?;
        self.ctx.read(|ledger| {
            let employee_name = ledger
                .employee(examination.employee_id)
                .map(|employee| employee.full_name())
                .unwrap_or_default();
            let clinic_name = ledger
                .organization(examination.clinic_id)
                .map(|clinic| clinic.name.clone())
                .unwrap_or_default();
            Ok(FrontDeskView {
                examination_id: examination.id,
                employee_name,
                clinic_name,
                kind: examination.kind,
                status: examination.status(),
                scheduled_at: examination.scheduled_at,
                progress: examination.progress(),
            })
        })
    }
}
