use crate::workflows::documents::{DocumentContent, DocumentKind, DocumentStatus};
use crate::workflows::examinations::{ExaminationKind, ExaminationResult};
use crate::workflows::tests::common::harness;
use crate::workflows::WorkflowError;

#[test]
fn completion_issues_a_signed_certificate_snapshot() {
    let h = harness();
    let examination = h.complete_welder(ExaminationResult::Limited);

    let ledger = h.ledger();
    let certificate = ledger
        .certificate_for(examination.id)
        .expect("certificate issued on completion");
    assert_eq!(certificate.kind, DocumentKind::MedicalCertificate);
    assert_eq!(certificate.status(), DocumentStatus::Signed);
    assert_eq!(certificate.organization_id, h.dir.employer);
    assert_eq!(certificate.clinic_id, Some(h.dir.clinic));
    assert_eq!(certificate.year, 2025);

    let DocumentContent::Certificate(content) = &certificate.content else {
        panic!("expected certificate content, got {:?}", certificate.content);
    };
    assert_eq!(content.employee.full_name, "Bekov Arman Serikovich");
    assert_eq!(content.employee.national_id, "850712300123");
    assert_eq!(content.employee.position, "Electric Welder");
    assert_eq!(content.employer.name, "Karaganda Steelworks");
    assert_eq!(content.clinic.address.as_deref(), Some("12 Abay Avenue"));
    assert_eq!(content.result, ExaminationResult::Limited);
    assert_eq!(content.result_display, "Fit with limitations");
    assert_eq!(content.doctor_examinations.len(), 1);
    assert_eq!(content.doctor_examinations[0].harmful_factor, "Noise");
    assert_eq!(
        content.final_reviewer.as_ref().map(|reviewer| reviewer.member_id),
        Some(h.dir.final_reviewer)
    );
    assert_eq!(Some(content.examination_date), examination.completed_at());
}

#[test]
fn generating_again_returns_the_same_certificate() {
    let h = harness();
    let examination = h.complete_welder(ExaminationResult::Fit);
    let issued = h
        .ledger()
        .certificate_for(examination.id)
        .map(|document| document.id)
        .expect("issued");

    let again = h
        .workflows
        .documents
        .generate_medical_certificate(examination.id)
        .expect("generate");
    assert_eq!(again.id, issued);

    let certificates = h
        .ledger()
        .documents()
        .filter(|document| document.kind == DocumentKind::MedicalCertificate)
        .count();
    assert_eq!(certificates, 1);
}

#[test]
fn certificate_needs_a_completed_examination() {
    let h = harness();
    let examination = h.schedule_welder(ExaminationKind::Periodic);

    match h
        .workflows
        .documents
        .generate_medical_certificate(examination.id)
    {
        Err(WorkflowError::Precondition(message)) => assert!(message.contains("scheduled")),
        other => panic!("expected precondition failure, got {other:?}"),
    }
}
