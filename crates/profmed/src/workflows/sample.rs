//! A small seeded directory: one employer, one partner clinic, clinic staff and two employees.
//!
//! Backs the `demo` command and the scenario tests.

use chrono::{DateTime, Duration, Utc};

use crate::store::{Ledger, NewClinic, NewEmployer, NewStaffMember};
use crate::workflows::compliance::order_131_catalog;
use crate::workflows::directory::{
    NewEmployee, Partnership, PartnershipStatus, StaffRole, UserRef,
};
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{EmployeeId, MemberId, OrganizationId, PartnershipId, UserId};

/// Ids and owners of everything [`sample_ledger`] created.
#[derive(Debug, Clone)]
pub struct SampleDirectory {
    pub employer: OrganizationId,
    pub employer_owner: UserRef,
    pub clinic: OrganizationId,
    pub clinic_owner: UserRef,
    pub partnership: PartnershipId,
    pub otolaryngologist: MemberId,
    pub therapist: MemberId,
    pub final_reviewer: MemberId,
    pub registrar: MemberId,
    /// Electric Welder hired 400 days before `now`, never examined.
    pub welder: EmployeeId,
    pub welder_phone: String,
    /// Cook: a decreed profession without harmful factors.
    pub cook: EmployeeId,
}

fn user(id: u64) -> UserRef {
    UserRef {
        id: UserId(id),
        phone: format!("+7701000{id:04}"),
    }
}

/// Builds a ledger on the Order 131 reference catalog with an active clinic partnership.
pub fn sample_ledger(now: DateTime<Utc>) -> Result<(Ledger, SampleDirectory), WorkflowError> {
    let mut ledger = Ledger::with_catalog(order_131_catalog()?);
    let today = now.date_naive();

    let employer_owner = user(1);
    let employer = ledger.add_employer(NewEmployer {
        name: "Karaganda Steelworks".to_string(),
        owner: employer_owner.clone(),
    })?;

    let clinic_owner = user(2);
    let clinic = ledger.add_clinic(NewClinic {
        name: "City Occupational Clinic".to_string(),
        address: Some("12 Abay Avenue".to_string()),
        owner: clinic_owner.clone(),
        capacity_per_day: None,
    })?;

    let mut staff = |user_id: u64, full_name: &str, role: StaffRole, specialization: Option<&str>| {
        ledger.add_staff_member(NewStaffMember {
            organization_id: clinic,
            user: user(user_id),
            full_name: full_name.to_string(),
            role,
            specialization: specialization.map(str::to_string),
        })
    };
    let otolaryngologist = staff(10, "Seitkali Aigerim", StaffRole::Doctor, Some("otolaryngologist"))?;
    let therapist = staff(11, "Omarova Dana", StaffRole::Doctor, Some("therapist"))?;
    let final_reviewer = staff(12, "Zhunusov Marat", StaffRole::FinalReviewer, Some("occupational pathologist"))?;
    let registrar = staff(13, "Lee Anna", StaffRole::Registrar, None)?;

    let partnership = PartnershipId(ledger.allocate_id());
    ledger.insert_partnership(Partnership {
        id: partnership,
        clinic_id: clinic,
        employer_id: employer,
        status: PartnershipStatus::Active,
        is_public: false,
        default_price: 15_000,
        notes: None,
        requested_at: now - Duration::days(30),
        confirmed_at: Some(now - Duration::days(29)),
        expires_at: None,
    });

    let profession = |name: &str| {
        ledger
            .catalog()
            .profession_by_name(name)
            .map(|profession| profession.id)
            .ok_or_else(|| WorkflowError::not_found("profession", name))
    };
    let welder_position = profession("Electric Welder")?;
    let cook_position = profession("Cook")?;

    let welder_phone = "+77015550101".to_string();
    let welder = ledger.add_employee(NewEmployee {
        employer_id: employer,
        first_name: "Arman".to_string(),
        last_name: "Bekov".to_string(),
        middle_name: Some("Serikovich".to_string()),
        national_id: "850712300123".to_string(),
        position: Some(welder_position),
        department: Some("Welding shop".to_string()),
        hire_date: Some(today - Duration::days(400)),
        notes: None,
        phone: Some(welder_phone.clone()),
    })?;
    let cook = ledger.add_employee(NewEmployee {
        employer_id: employer,
        first_name: "Aliya".to_string(),
        last_name: "Nurlanova".to_string(),
        middle_name: None,
        national_id: "920304400567".to_string(),
        position: Some(cook_position),
        department: Some("Canteen".to_string()),
        hire_date: Some(today - Duration::days(90)),
        notes: None,
        phone: Some("+77015550102".to_string()),
    })?;

    let directory = SampleDirectory {
        employer,
        employer_owner,
        clinic,
        clinic_owner,
        partnership,
        otolaryngologist,
        therapist,
        final_reviewer,
        registrar,
        welder,
        welder_phone,
        cook,
    };
    Ok((ledger, directory))
}
