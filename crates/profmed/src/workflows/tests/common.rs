//! Shared test harness: the sample directory behind a memory store and a fixed clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::clock::FixedClock;
use crate::config::WorkflowSettings;
use crate::notifications::RecordingSender;
use crate::store::{Ledger, MemoryStore, NewClinic, NewEmployer, WorkflowStore};
use crate::workflows::compliance::ContraindicationMatching;
use crate::workflows::directory::{NoopEvents, UserRef};
use crate::workflows::examinations::{
    DoctorFindings, ExaminationKind, ExaminationRequest, ExaminationResult, MedicalExamination,
};
use crate::workflows::ids::{FactorId, MemberId, OrganizationId, UserId};
use crate::workflows::sample::{sample_ledger, SampleDirectory};
use crate::workflows::{Order131Workflows, WorkflowContext};

pub(crate) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap()
}

pub(crate) struct Harness {
    pub workflows: Order131Workflows<MemoryStore, RecordingSender>,
    pub ctx: WorkflowContext<MemoryStore, RecordingSender>,
    pub store: Arc<MemoryStore>,
    pub sender: RecordingSender,
    pub clock: Arc<FixedClock>,
    pub dir: SampleDirectory,
}

pub(crate) fn harness() -> Harness {
    harness_with(WorkflowSettings::default())
}

pub(crate) fn harness_with(settings: WorkflowSettings) -> Harness {
    let (ledger, dir) = sample_ledger(start()).expect("sample directory");
    let store = Arc::new(MemoryStore::new(ledger));
    let sender = RecordingSender::default();
    let clock = Arc::new(FixedClock::new(start()));
    let ctx = WorkflowContext::new(Arc::clone(&store), Arc::new(sender.clone()), settings)
        .with_clock(clock.clone());
    let workflows = Order131Workflows::new(ctx.clone(), Arc::new(NoopEvents));
    Harness {
        workflows,
        ctx,
        store,
        sender,
        clock,
        dir,
    }
}

pub(crate) fn owner(id: u64) -> UserRef {
    UserRef {
        id: UserId(id),
        phone: format!("+7702000{id:04}"),
    }
}

pub(crate) fn deduplicating() -> WorkflowSettings {
    WorkflowSettings {
        contraindication_matching: ContraindicationMatching::Deduplicated,
        ..WorkflowSettings::default()
    }
}

impl Harness {
    pub fn ledger(&self) -> Ledger {
        self.store.load().expect("load ledger").ledger
    }

    /// Applies a direct edit to the stored ledger, bypassing the workflows.
    pub fn edit(&self, change: impl FnOnce(&mut Ledger)) {
        let snapshot = self.store.load().expect("load ledger");
        let mut ledger = snapshot.ledger;
        change(&mut ledger);
        self.store
            .commit(snapshot.revision, ledger)
            .expect("commit edit");
    }

    pub fn add_clinic(&self, name: &str, owner: &UserRef) -> OrganizationId {
        let mut added = None;
        self.edit(|ledger| {
            added = Some(
                ledger
                    .add_clinic(NewClinic {
                        name: name.to_string(),
                        address: None,
                        owner: owner.clone(),
                        capacity_per_day: None,
                    })
                    .expect("add clinic"),
            );
        });
        added.expect("clinic added")
    }

    pub fn add_employer(&self, name: &str, owner: &UserRef) -> OrganizationId {
        let mut added = None;
        self.edit(|ledger| {
            added = Some(
                ledger
                    .add_employer(NewEmployer {
                        name: name.to_string(),
                        owner: owner.clone(),
                    })
                    .expect("add employer"),
            );
        });
        added.expect("employer added")
    }

    pub fn factor(&self, code: &str) -> FactorId {
        self.ledger()
            .catalog()
            .factor_by_code(code)
            .map(|factor| factor.id)
            .expect("seeded factor")
    }

    pub fn schedule_welder(&self, kind: ExaminationKind) -> MedicalExamination {
        self.workflows
            .examinations
            .create_examination(ExaminationRequest {
                employee_id: self.dir.welder,
                kind,
                clinic_id: self.dir.clinic,
                scheduled_at: start() + Duration::days(1),
                employer_id: None,
                reason: None,
            })
            .expect("schedule welder")
    }

    pub fn findings(&self, doctor: MemberId, code: &str, result: ExaminationResult) -> DoctorFindings {
        DoctorFindings {
            doctor_id: doctor,
            factor_id: self.factor(code),
            result,
            findings: "No pathology found".to_string(),
            recommendations: String::new(),
            icd_codes: Vec::new(),
        }
    }

    /// Schedules, examines and completes a welder examination with `result`.
    pub fn complete_welder(&self, result: ExaminationResult) -> MedicalExamination {
        let examination = self.schedule_welder(ExaminationKind::Periodic);
        let service = &self.workflows.examinations;
        service
            .start_examination(examination.id)
            .expect("start");
        service
            .add_doctor_examination(
                examination.id,
                self.findings(self.dir.otolaryngologist, "1.2.1", result),
            )
            .expect("record findings");
        service
            .complete_examination(examination.id, result, self.dir.final_reviewer)
            .expect("complete")
            .examination
    }
}
