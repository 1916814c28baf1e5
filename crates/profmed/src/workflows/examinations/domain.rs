use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::directory::StaffRole;
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{
    ContraindicationId, DoctorExaminationId, EmployeeId, ExaminationId, FactorId, LabResultId,
    MemberId, OrganizationId,
};

/// Opaque code printed as a QR code; lets the patient or front desk find the examination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExaminationKind {
    Preliminary,
    Periodic,
    Extraordinary,
}

impl ExaminationKind {
    pub const fn label(self) -> &'static str {
        match self {
            ExaminationKind::Preliminary => "preliminary",
            ExaminationKind::Periodic => "periodic",
            ExaminationKind::Extraordinary => "extraordinary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExaminationStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl ExaminationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ExaminationStatus::Scheduled => "scheduled",
            ExaminationStatus::InProgress => "in_progress",
            ExaminationStatus::Completed => "completed",
            ExaminationStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ExaminationStatus::Completed | ExaminationStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExaminationResult {
    Fit,
    Unfit,
    Limited,
}

impl ExaminationResult {
    pub const fn label(self) -> &'static str {
        match self {
            ExaminationResult::Fit => "fit",
            ExaminationResult::Unfit => "unfit",
            ExaminationResult::Limited => "limited",
        }
    }

    pub const fn display(self) -> &'static str {
        match self {
            ExaminationResult::Fit => "Fit for work",
            ExaminationResult::Unfit => "Unfit for work",
            ExaminationResult::Limited => "Fit with limitations",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAssignment {
    pub member_id: MemberId,
    pub role: StaffRole,
    pub specialization: Option<String>,
}

/// Staff an examination has to pass through. Assignments are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExaminationRoute {
    assignments: Vec<RouteAssignment>,
}

impl ExaminationRoute {
    /// Adds an assignment unless the same member already holds that role.
    pub fn push(&mut self, assignment: RouteAssignment) -> bool {
        let duplicate = self
            .assignments
            .iter()
            .any(|existing| existing.member_id == assignment.member_id && existing.role == assignment.role);
        if duplicate {
            return false;
        }
        self.assignments.push(assignment);
        true
    }

    pub fn assignments(&self) -> &[RouteAssignment] {
        &self.assignments
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn final_reviewer(&self) -> Option<&RouteAssignment> {
        self.assignments
            .iter()
            .find(|assignment| assignment.role == StaffRole::FinalReviewer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorExamination {
    pub id: DoctorExaminationId,
    pub doctor_id: MemberId,
    pub factor_id: FactorId,
    pub result: ExaminationResult,
    pub findings: String,
    pub recommendations: String,
    pub icd_codes: Vec<String>,
    pub contraindications: BTreeSet<ContraindicationId>,
    pub examined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaboratoryResult {
    pub id: LabResultId,
    pub test_name: String,
    pub test_code: Option<String>,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub is_normal: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Examination aggregate. Status and disposition only change through the transition methods,
/// so `result` and `completed_at` are present exactly when the status is `completed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicalExamination {
    pub id: ExaminationId,
    pub employee_id: EmployeeId,
    pub clinic_id: OrganizationId,
    pub employer_id: OrganizationId,
    pub kind: ExaminationKind,
    pub scheduled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub access_token: AccessToken,
    pub route: ExaminationRoute,
    pub doctor_examinations: Vec<DoctorExamination>,
    pub laboratory_results: Vec<LaboratoryResult>,
    pub created_at: DateTime<Utc>,
    status: ExaminationStatus,
    result: Option<ExaminationResult>,
    completed_at: Option<DateTime<Utc>>,
    final_reviewer: Option<MemberId>,
    cancellation_reason: Option<String>,
}

impl MedicalExamination {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn scheduled(
        id: ExaminationId,
        employee_id: EmployeeId,
        clinic_id: OrganizationId,
        employer_id: OrganizationId,
        kind: ExaminationKind,
        scheduled_at: DateTime<Utc>,
        reason: Option<String>,
        access_token: AccessToken,
        route: ExaminationRoute,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            employee_id,
            clinic_id,
            employer_id,
            kind,
            scheduled_at,
            reason,
            access_token,
            route,
            doctor_examinations: Vec::new(),
            laboratory_results: Vec::new(),
            created_at,
            status: ExaminationStatus::Scheduled,
            result: None,
            completed_at: None,
            final_reviewer: None,
            cancellation_reason: None,
        }
    }

    pub fn status(&self) -> ExaminationStatus {
        self.status
    }

    pub fn result(&self) -> Option<ExaminationResult> {
        self.result
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn final_reviewer(&self) -> Option<MemberId> {
        self.final_reviewer
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn is_live(&self) -> bool {
        self.status != ExaminationStatus::Cancelled
    }

    fn reject(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidState {
            entity: "examination",
            status: self.status.label(),
            action,
        }
    }

    pub(crate) fn ensure_open(&self, action: &'static str) -> Result<(), WorkflowError> {
        if self.status.is_terminal() {
            return Err(self.reject(action));
        }
        Ok(())
    }

    /// Starting an examination that is already in progress is a no-op.
    pub(crate) fn start(&mut self) -> Result<(), WorkflowError> {
        match self.status {
            ExaminationStatus::Scheduled => {
                self.status = ExaminationStatus::InProgress;
                Ok(())
            }
            ExaminationStatus::InProgress => Ok(()),
            _ => Err(self.reject("start")),
        }
    }

    pub(crate) fn complete(
        &mut self,
        result: ExaminationResult,
        reviewer: MemberId,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.ensure_open("complete")?;
        self.status = ExaminationStatus::Completed;
        self.result = Some(result);
        self.completed_at = Some(now);
        self.final_reviewer = Some(reviewer);
        Ok(())
    }

    pub(crate) fn cancel(&mut self, reason: String) -> Result<(), WorkflowError> {
        self.ensure_open("cancel")?;
        self.status = ExaminationStatus::Cancelled;
        self.cancellation_reason = Some(reason);
        Ok(())
    }

    pub fn has_findings_from(&self, doctor: MemberId, factor: FactorId) -> bool {
        self.doctor_examinations
            .iter()
            .any(|record| record.doctor_id == doctor && record.factor_id == factor)
    }

    pub fn progress(&self) -> ExaminationProgress {
        let total_required = self.route.len();
        let completed_count = self
            .route
            .assignments()
            .iter()
            .filter(|assignment| self.assignment_done(assignment))
            .count();
        let percent = if total_required > 0 {
            (completed_count * 100 / total_required) as u32
        } else {
            0
        };

        ExaminationProgress {
            total_required,
            completed_count,
            percent,
            is_complete: completed_count >= total_required,
        }
    }

    fn assignment_done(&self, assignment: &RouteAssignment) -> bool {
        let examined = self
            .doctor_examinations
            .iter()
            .any(|record| record.doctor_id == assignment.member_id);
        match assignment.role {
            StaffRole::FinalReviewer => {
                examined || self.status == ExaminationStatus::Completed
            }
            _ => examined,
        }
    }
}

/// Parameters for scheduling one examination.
#[derive(Debug, Clone, Deserialize)]
pub struct ExaminationRequest {
    pub employee_id: EmployeeId,
    pub kind: ExaminationKind,
    pub clinic_id: OrganizationId,
    pub scheduled_at: DateTime<Utc>,
    /// Defaults to the employee's employer.
    #[serde(default)]
    pub employer_id: Option<OrganizationId>,
    /// Required for extraordinary examinations.
    #[serde(default)]
    pub reason: Option<String>,
}

/// One doctor's conclusion for one harmful factor.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorFindings {
    pub doctor_id: MemberId,
    pub factor_id: FactorId,
    pub result: ExaminationResult,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub recommendations: String,
    #[serde(default)]
    pub icd_codes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LaboratoryResultInput {
    pub test_name: String,
    #[serde(default)]
    pub test_code: Option<String>,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
    pub is_normal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExaminationProgress {
    pub total_required: usize,
    pub completed_count: usize,
    pub percent: u32,
    pub is_complete: bool,
}
