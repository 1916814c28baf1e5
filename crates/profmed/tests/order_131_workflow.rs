use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use profmed::clock::FixedClock;
use profmed::config::WorkflowSettings;
use profmed::notifications::RecordingSender;
use profmed::store::MemoryStore;
use profmed::workflows::directory::NoopEvents;
use profmed::workflows::documents::{
    DocumentContent, DocumentStatus, SignatureAudit, SignerRole,
};
use profmed::workflows::examinations::{DoctorFindings, ExaminationResult, ExaminationStatus};
use profmed::workflows::sample::{sample_ledger, SampleDirectory};
use profmed::workflows::scheduling::CalendarPlanRequest;
use profmed::workflows::{Order131Workflows, WorkflowContext, WorkflowError};

struct Scenario {
    workflows: Order131Workflows<MemoryStore, RecordingSender>,
    sender: RecordingSender,
    clock: Arc<FixedClock>,
    dir: SampleDirectory,
}

fn scenario() -> Scenario {
    let now = Utc
        .with_ymd_and_hms(2025, 3, 3, 8, 0, 0)
        .single()
        .expect("valid start instant");
    let (ledger, dir) = sample_ledger(now).expect("sample directory");
    let store = Arc::new(MemoryStore::new(ledger));
    let sender = RecordingSender::default();
    let clock = Arc::new(FixedClock::new(now));
    let ctx = WorkflowContext::new(
        store,
        Arc::new(sender.clone()),
        WorkflowSettings::default(),
    )
    .with_clock(clock.clone());
    Scenario {
        workflows: Order131Workflows::new(ctx, Arc::new(NoopEvents)),
        sender,
        clock,
        dir,
    }
}

/// Pulls the latest one-time code out of the signing messages sent to `phone`.
fn last_code(sender: &RecordingSender, phone: &str) -> String {
    sender
        .sent_to(phone)
        .iter()
        .rev()
        .find_map(|message| {
            let first_line = message.lines().next()?;
            let (prefix, code) = first_line.rsplit_once(": ")?;
            prefix
                .starts_with("Code for signing document")
                .then(|| code.trim().to_string())
        })
        .expect("signature code message")
}

#[test]
fn electric_welder_goes_from_roster_to_approved_final_act() {
    let s = scenario();
    let dir = &s.dir;

    let roster = s
        .workflows
        .schedule
        .generate_roster(dir.employer, 2025)
        .expect("roster");
    match &roster.content {
        DocumentContent::Roster(content) => {
            assert_eq!(content.total_count, 1, "only the welder works with harmful factors");
            assert_eq!(content.employees[0].id, dir.welder);
        }
        other => panic!("expected roster content, got {other:?}"),
    }

    let april_first = NaiveDate::from_ymd_opt(2025, 4, 1).expect("valid date");
    let scheduled = s
        .workflows
        .schedule
        .generate_calendar_plan(CalendarPlanRequest {
            employer_id: dir.employer,
            clinic_id: dir.clinic,
            year: 2025,
            start_date: april_first,
            end_date: None,
        })
        .expect("calendar plan");
    assert_eq!(scheduled.examinations.len(), 1);
    let token = scheduled.examinations[0].access_token.as_str().to_string();
    assert!(s
        .sender
        .sent_to(&dir.welder_phone)
        .iter()
        .any(|message| message.contains(&token)));

    s.clock.set(
        Utc.with_ymd_and_hms(2025, 4, 1, 9, 5, 0)
            .single()
            .expect("visit instant"),
    );
    let view = s
        .workflows
        .examinations
        .front_desk_view(&token)
        .expect("registrar scans the token");
    assert_eq!(view.employee_name, "Bekov Arman Serikovich");
    assert_eq!(view.status, ExaminationStatus::Scheduled);
    let examination_id = view.examination_id;

    let examinations = &s.workflows.examinations;
    examinations
        .start_examination(examination_id)
        .expect("start");
    for (doctor, code) in [(dir.otolaryngologist, "1.2.1"), (dir.therapist, "2.1.1")] {
        examinations
            .add_doctor_examination(
                examination_id,
                DoctorFindings {
                    doctor_id: doctor,
                    factor_id: examinations.harmful_factor(code).expect("seeded factor").id,
                    result: ExaminationResult::Fit,
                    findings: "Within normal limits".to_string(),
                    recommendations: String::new(),
                    icd_codes: Vec::new(),
                },
            )
            .expect("findings");
    }
    let progress = examinations
        .get_examination_progress(examination_id)
        .expect("progress");
    assert!(progress.completed_count >= 2);

    let completed = examinations
        .complete_examination(examination_id, ExaminationResult::Fit, dir.final_reviewer)
        .expect("complete");
    assert_eq!(completed.examination.status(), ExaminationStatus::Completed);
    assert_eq!(completed.certificate.examination_id, Some(examination_id));
    assert!(s
        .sender
        .sent_to(&dir.employer_owner.phone)
        .iter()
        .any(|message| message.contains("Result: Fit for work")));

    let act = s
        .workflows
        .schedule
        .generate_final_act(dir.employer, dir.clinic, 2025)
        .expect("final act");
    match &act.content {
        DocumentContent::FinalAct(content) => {
            assert_eq!(content.statistics.total_examined, 1);
            assert_eq!(content.statistics.fit, 1);
        }
        other => panic!("expected final act content, got {other:?}"),
    }

    let documents = &s.workflows.documents;
    let signers = [
        (SignerRole::Clinic, dir.clinic_owner.phone.as_str()),
        (SignerRole::Employer, dir.employer_owner.phone.as_str()),
    ];
    for (role, _) in signers {
        documents
            .request_signature(act.id, role)
            .expect("request signature");
    }
    for (role, phone) in signers {
        s.clock.advance(Duration::minutes(1));
        let code = last_code(&s.sender, phone);
        documents
            .verify_and_sign(act.id, role, &code, SignatureAudit::default())
            .expect("sign");
    }
    assert_eq!(
        documents.document(act.id).expect("act").status(),
        DocumentStatus::Signed
    );

    let approved = documents.approve_document(act.id).expect("approve");
    assert_eq!(approved.status(), DocumentStatus::Approved);
}

#[test]
fn late_code_is_refused_and_a_new_one_works() {
    let s = scenario();
    let roster = s
        .workflows
        .schedule
        .generate_roster(s.dir.employer, 2025)
        .expect("roster");
    let documents = &s.workflows.documents;
    let phone = s.dir.employer_owner.phone.as_str();

    documents
        .request_signature(roster.id, SignerRole::Employer)
        .expect("request");
    let stale = last_code(&s.sender, phone);
    s.clock.advance(Duration::minutes(6));
    match documents.verify_and_sign(roster.id, SignerRole::Employer, &stale, SignatureAudit::default()) {
        Err(WorkflowError::ExpiredCode) => {}
        other => panic!("expected expired code, got {other:?}"),
    }
    assert_eq!(
        documents.document(roster.id).expect("roster").status(),
        DocumentStatus::PendingSignature
    );

    documents
        .request_signature(roster.id, SignerRole::Employer)
        .expect("request again");
    let fresh = last_code(&s.sender, phone);
    let signed = documents
        .verify_and_sign(roster.id, SignerRole::Employer, &fresh, SignatureAudit::default())
        .expect("sign with the new code");
    assert!(signed.verified);
    assert_eq!(
        documents.document(roster.id).expect("roster").status(),
        DocumentStatus::Signed
    );
}
