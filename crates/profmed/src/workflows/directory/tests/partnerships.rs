use chrono::Duration;

use crate::clock::Clock;
use crate::workflows::directory::{PartnershipStatus, PartnershipTerms};
use crate::workflows::documents::DocumentContent;
use crate::workflows::ids::OrganizationId;
use crate::workflows::tests::common::{harness, owner, Harness};
use crate::workflows::WorkflowError;

fn steppe_clinic(h: &Harness) -> OrganizationId {
    h.add_clinic("Steppe Medical Centre", &owner(30))
}

fn serving_ids(h: &Harness, employer: OrganizationId) -> Vec<OrganizationId> {
    h.workflows
        .partnerships
        .clinics_serving(employer)
        .expect("clinics serving")
        .into_iter()
        .map(|clinic| clinic.id)
        .collect()
}

#[test]
fn request_waits_for_the_clinic_owner() {
    let h = harness();
    let clinic = steppe_clinic(&h);

    let requested = h
        .workflows
        .partnerships
        .request_partnership(h.dir.employer, clinic, 12_000)
        .expect("request");
    assert_eq!(requested.status, PartnershipStatus::Pending);
    assert_eq!(requested.requested_at, h.clock.now());

    let messages = h.sender.sent_to(&owner(30).phone);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Karaganda Steelworks"));
    assert!(messages[0].contains("12000"));
    assert_eq!(serving_ids(&h, h.dir.employer), vec![h.dir.clinic]);
}

#[test]
fn live_partnerships_cannot_be_requested_again() {
    let h = harness();
    match h
        .workflows
        .partnerships
        .request_partnership(h.dir.employer, h.dir.clinic, 10_000)
    {
        Err(WorkflowError::Conflict(message)) => assert!(message.contains("active")),
        other => panic!("expected conflict, got {other:?}"),
    }

    let clinic = steppe_clinic(&h);
    let partnerships = &h.workflows.partnerships;
    partnerships
        .request_partnership(h.dir.employer, clinic, 10_000)
        .expect("first request");
    match partnerships.request_partnership(h.dir.employer, clinic, 11_000) {
        Err(WorkflowError::Conflict(message)) => assert!(message.contains("pending")),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn confirmation_opens_the_clinic_to_the_employer() {
    let h = harness();
    let clinic = steppe_clinic(&h);
    let partnerships = &h.workflows.partnerships;
    let requested = partnerships
        .request_partnership(h.dir.employer, clinic, 12_000)
        .expect("request");

    let expires_at = h.clock.now() + Duration::days(365);
    let confirmed = partnerships
        .confirm_partnership(
            requested.id,
            PartnershipTerms {
                default_price: Some(14_000),
                notes: Some("Annual contract".to_string()),
                expires_at: Some(expires_at),
                is_public: false,
            },
        )
        .expect("confirm");
    assert_eq!(confirmed.status, PartnershipStatus::Active);
    assert_eq!(confirmed.confirmed_at, Some(h.clock.now()));
    assert_eq!(confirmed.expires_at, Some(expires_at));
    assert_eq!(confirmed.default_price, 14_000);

    let messages = h.sender.sent_to(&h.dir.employer_owner.phone);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Steppe Medical Centre"));
    assert!(messages[0].contains("Price: 14000"));

    assert_eq!(serving_ids(&h, h.dir.employer), vec![h.dir.clinic, clinic]);
}

#[test]
fn expiry_must_lie_in_the_future() {
    let h = harness();
    let clinic = steppe_clinic(&h);
    let partnerships = &h.workflows.partnerships;
    let requested = partnerships
        .request_partnership(h.dir.employer, clinic, 12_000)
        .expect("request");

    match partnerships.confirm_partnership(
        requested.id,
        PartnershipTerms {
            expires_at: Some(h.clock.now()),
            ..PartnershipTerms::default()
        },
    ) {
        Err(WorkflowError::Validation(_)) => {}
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(
        partnerships.partnership(requested.id).expect("partnership").status,
        PartnershipStatus::Pending
    );
    assert!(h.sender.sent_to(&h.dir.employer_owner.phone).is_empty());
}

#[test]
fn rejected_requests_may_be_made_again() {
    let h = harness();
    let clinic = steppe_clinic(&h);
    let partnerships = &h.workflows.partnerships;
    let requested = partnerships
        .request_partnership(h.dir.employer, clinic, 12_000)
        .expect("request");

    let rejected = partnerships.reject_partnership(requested.id).expect("reject");
    assert_eq!(rejected.status, PartnershipStatus::Rejected);
    match partnerships.reject_partnership(requested.id) {
        Err(WorkflowError::InvalidState { status, .. }) => assert_eq!(status, "rejected"),
        other => panic!("expected invalid state, got {other:?}"),
    }

    let again = partnerships
        .request_partnership(h.dir.employer, clinic, 9_000)
        .expect("request again");
    assert_eq!(again.id, requested.id);
    assert_eq!(again.status, PartnershipStatus::Pending);
    assert_eq!(again.default_price, 9_000);
}

#[test]
fn suspended_clinics_stop_serving_until_confirmed_again() {
    let h = harness();
    let partnerships = &h.workflows.partnerships;

    let suspended = partnerships
        .suspend_partnership(h.dir.partnership)
        .expect("suspend");
    assert_eq!(suspended.status, PartnershipStatus::Suspended);
    assert!(serving_ids(&h, h.dir.employer).is_empty());
    match partnerships.suspend_partnership(h.dir.partnership) {
        Err(WorkflowError::InvalidState { status, .. }) => assert_eq!(status, "suspended"),
        other => panic!("expected invalid state, got {other:?}"),
    }

    partnerships
        .confirm_partnership(h.dir.partnership, PartnershipTerms::default())
        .expect("resume");
    assert_eq!(serving_ids(&h, h.dir.employer), vec![h.dir.clinic]);
}

#[test]
fn lapsed_partnerships_expire_and_may_be_renewed() {
    let h = harness();
    let clinic = steppe_clinic(&h);
    let partnerships = &h.workflows.partnerships;
    let requested = partnerships
        .request_partnership(h.dir.employer, clinic, 12_000)
        .expect("request");
    partnerships
        .confirm_partnership(
            requested.id,
            PartnershipTerms {
                expires_at: Some(h.clock.now() + Duration::days(10)),
                ..PartnershipTerms::default()
            },
        )
        .expect("confirm");

    assert_eq!(partnerships.expire_stale_partnerships().expect("sweep"), 0);
    h.clock.advance(Duration::days(10));
    assert_eq!(serving_ids(&h, h.dir.employer), vec![h.dir.clinic]);
    assert_eq!(partnerships.expire_stale_partnerships().expect("sweep"), 1);
    assert_eq!(
        partnerships.partnership(requested.id).expect("partnership").status,
        PartnershipStatus::Expired
    );
    assert_eq!(
        partnerships.partnership(h.dir.partnership).expect("sample partnership").status,
        PartnershipStatus::Active
    );

    let renewed = partnerships
        .request_partnership(h.dir.employer, clinic, 12_000)
        .expect("renew");
    assert_eq!(renewed.id, requested.id);
    assert_eq!(renewed.status, PartnershipStatus::Pending);
}

#[test]
fn public_clinics_serve_every_employer() {
    let h = harness();
    let clinic = steppe_clinic(&h);
    let miner = h.add_employer("Temirtau Mining", &owner(40));
    let partnerships = &h.workflows.partnerships;
    let requested = partnerships
        .request_partnership(miner, clinic, 8_000)
        .expect("request");
    assert_eq!(serving_ids(&h, h.dir.employer), vec![h.dir.clinic]);

    partnerships
        .confirm_partnership(
            requested.id,
            PartnershipTerms {
                is_public: true,
                ..PartnershipTerms::default()
            },
        )
        .expect("confirm as public");

    let serving = partnerships
        .clinics_serving(h.dir.employer)
        .expect("clinics serving");
    assert_eq!(serving.len(), 2);
    assert_eq!(serving[1].id, clinic);
    assert_eq!(serving[1].partnership_id, requested.id);

    let roster = h
        .workflows
        .schedule
        .generate_roster(h.dir.employer, 2025)
        .expect("roster");
    match roster.content {
        DocumentContent::Roster(content) => {
            let offered: Vec<OrganizationId> = content
                .available_clinics_for_calendar_plan
                .iter()
                .map(|available| available.id)
                .collect();
            assert_eq!(offered, vec![h.dir.clinic, clinic]);
        }
        other => panic!("expected roster content, got {other:?}"),
    }
}

#[test]
fn clinics_serving_requires_an_employer() {
    let h = harness();
    match h.workflows.partnerships.clinics_serving(h.dir.clinic) {
        Err(WorkflowError::NotFound { entity, .. }) => assert_eq!(entity, "employer"),
        other => panic!("expected missing employer, got {other:?}"),
    }
}
