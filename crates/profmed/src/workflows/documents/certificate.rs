use chrono::{DateTime, Datelike, Utc};

use super::content::{
    CertificateClinic, CertificateContent, CertificateEmployee, CertificateEmployer,
    CertificateFinding, CertificateReviewer, DocumentContent,
};
use super::domain::{DocumentDraft, DocumentKind, DocumentStatus};
use crate::store::Ledger;
use crate::workflows::error::WorkflowError;
use crate::workflows::examinations::ExaminationStatus;
use crate::workflows::ids::{DocumentId, ExaminationId};

/// Issues the form 075/u certificate for a completed examination.
///
/// The certificate snapshots names as they are now; later directory edits do not touch it.
/// An examination gets at most one certificate, so issuing twice returns the first.
pub(crate) fn issue_in_ledger(
    ledger: &mut Ledger,
    examination_id: ExaminationId,
    now: DateTime<Utc>,
) -> Result<DocumentId, WorkflowError> {
    if let Some(existing) = ledger.certificate_for(examination_id) {
        return Ok(existing.id);
    }

    let examination = ledger.require_examination(examination_id)?;
    let result = match (examination.status(), examination.result()) {
        (ExaminationStatus::Completed, Some(result)) => result,
        (status, _) => {
            return Err(WorkflowError::Precondition(format!(
                "certificate needs a completed examination, {} is {}",
                examination.id,
                status.label()
            )))
        }
    };

    let employee = ledger.require_employee(examination.employee_id)?;
    let employer = ledger.require_employer(examination.employer_id)?;
    let clinic = ledger.require_clinic(examination.clinic_id)?;
    let catalog = ledger.catalog();

    let position = employee
        .position
        .and_then(|id| catalog.profession(id))
        .map(|profession| profession.name.clone())
        .unwrap_or_default();

    let doctor_examinations = examination
        .doctor_examinations
        .iter()
        .map(|record| {
            let doctor = ledger.member(record.doctor_id);
            CertificateFinding {
                doctor: doctor
                    .map(|member| member.full_name.clone())
                    .unwrap_or_default(),
                specialization: doctor
                    .and_then(|member| member.specialization.clone())
                    .unwrap_or_default(),
                harmful_factor: catalog
                    .factor(record.factor_id)
                    .map(|factor| factor.name.clone())
                    .unwrap_or_default(),
                result: record.result.display().to_string(),
                findings: record.findings.clone(),
            }
        })
        .collect();

    let final_reviewer = examination
        .final_reviewer()
        .and_then(|id| ledger.member(id))
        .map(|member| CertificateReviewer {
            member_id: member.id,
            full_name: member.full_name.clone(),
            phone: member.user.phone.clone(),
        });

    let completed_at = examination.completed_at().unwrap_or(now);
    let content = CertificateContent {
        employee: CertificateEmployee {
            full_name: employee.full_name(),
            national_id: employee.national_id.clone(),
            position,
            department: employee.department.clone().unwrap_or_default(),
        },
        employer: CertificateEmployer {
            name: employer.name.clone(),
        },
        clinic: CertificateClinic {
            name: clinic.name.clone(),
            address: clinic.address.clone(),
        },
        examination_date: completed_at,
        result,
        result_display: result.display().to_string(),
        doctor_examinations,
        final_reviewer,
        generated_at: now,
    };

    let draft = DocumentDraft {
        organization_id: examination.employer_id,
        clinic_id: Some(examination.clinic_id),
        examination_id: Some(examination_id),
        kind: DocumentKind::MedicalCertificate,
        title: format!("Medical certificate 075/u - {}", employee.full_name()),
        year: completed_at.year(),
        content: DocumentContent::Certificate(content),
        status: DocumentStatus::Signed,
    };
    Ok(ledger.insert_document(draft, now))
}
