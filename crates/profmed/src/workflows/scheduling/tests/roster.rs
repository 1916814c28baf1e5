use crate::workflows::documents::{DocumentContent, DocumentKind, DocumentStatus, RosterContent};
use chrono::Duration;

use crate::workflows::examinations::{ExaminationKind, ExaminationResult};
use crate::workflows::tests::common::{harness, Harness};
use crate::workflows::WorkflowError;

fn roster_content(h: &Harness, year: i32) -> RosterContent {
    let document = h
        .workflows
        .schedule
        .generate_roster(h.dir.employer, year)
        .expect("roster");
    match document.content {
        DocumentContent::Roster(content) => content,
        other => panic!("expected roster content, got {other:?}"),
    }
}

#[test]
fn lists_employees_exposed_to_harmful_factors() {
    let h = harness();
    let roster = roster_content(&h, 2025);

    assert_eq!(roster.total_count, 1);
    let entry = &roster.employees[0];
    assert_eq!(entry.id, h.dir.welder);
    assert_eq!(entry.full_name, "Bekov Arman Serikovich");
    assert_eq!(entry.position, "Electric Welder");
    assert_eq!(entry.department, "Welding shop");
    assert_eq!(
        entry.date_of_birth.map(|date| date.to_string()).as_deref(),
        Some("1985-07-12")
    );
    assert!(entry.harmful_factors.contains("Noise"));
    assert!(entry.harmful_factors.contains("Welding aerosols"));
    assert!(entry.last_examination_date.is_none());
    assert_eq!(roster.available_clinics_for_calendar_plan.len(), 1);
    assert_eq!(roster.available_clinics_for_calendar_plan[0].id, h.dir.clinic);
}

#[test]
fn regenerating_keeps_one_document_per_year() {
    let h = harness();
    let first = h
        .workflows
        .schedule
        .generate_roster(h.dir.employer, 2025)
        .expect("first");
    let second = h
        .workflows
        .schedule
        .generate_roster(h.dir.employer, 2025)
        .expect("second");
    assert_eq!(first.id, second.id);
    assert_eq!(second.status(), DocumentStatus::Draft);
    assert_eq!(second.kind, DocumentKind::Roster);

    let rosters = h
        .ledger()
        .documents()
        .filter(|document| document.kind == DocumentKind::Roster)
        .count();
    assert_eq!(rosters, 1);

    let next_year = h
        .workflows
        .schedule
        .generate_roster(h.dir.employer, 2026)
        .expect("next year");
    assert_ne!(next_year.id, first.id);
}

fn examine_welder_for_every_factor(h: &Harness) {
    let examination = h.schedule_welder(ExaminationKind::Periodic);
    let service = &h.workflows.examinations;
    service.start_examination(examination.id).expect("start");
    for code in ["2.1.1", "1.3.1", "1.2.1"] {
        service
            .add_doctor_examination(
                examination.id,
                h.findings(h.dir.otolaryngologist, code, ExaminationResult::Fit),
            )
            .expect("findings");
    }
    service
        .complete_examination(examination.id, ExaminationResult::Fit, h.dir.final_reviewer)
        .expect("complete");
}

#[test]
fn employees_examined_for_every_factor_this_year_drop_off() {
    let h = harness();
    examine_welder_for_every_factor(&h);

    assert_eq!(roster_content(&h, 2025).total_count, 0);
}

#[test]
fn short_periodicity_brings_the_employee_back_after_six_months() {
    let h = harness();
    let noise = h.factor("1.2.1");
    h.edit(|ledger| {
        ledger
            .catalog_mut()
            .set_factor_periodicity(noise, 6)
            .expect("six month periodicity");
    });
    examine_welder_for_every_factor(&h);

    h.clock.advance(Duration::days(179));
    assert_eq!(roster_content(&h, 2025).total_count, 0);

    h.clock.advance(Duration::days(1));
    let roster = roster_content(&h, 2025);
    assert_eq!(roster.total_count, 1);
    assert_eq!(roster.employees[0].id, h.dir.welder);
}

#[test]
fn partially_examined_employees_stay_due() {
    let h = harness();
    h.complete_welder(ExaminationResult::Fit);

    let roster = roster_content(&h, 2025);
    assert_eq!(roster.total_count, 1);
    assert!(roster.employees[0].last_examination_date.is_some());
}

#[test]
fn inactive_employees_are_left_out() {
    let h = harness();
    h.workflows
        .employees
        .deactivate(h.dir.welder)
        .expect("deactivate");
    assert_eq!(roster_content(&h, 2025).total_count, 0);
}

#[test]
fn roster_requires_a_known_employer() {
    let h = harness();
    match h.workflows.schedule.generate_roster(h.dir.clinic, 2025) {
        Err(WorkflowError::NotFound { entity, .. }) => assert_eq!(entity, "employer"),
        other => panic!("expected missing employer, got {other:?}"),
    }
}
