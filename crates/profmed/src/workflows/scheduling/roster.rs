//! Appendix 3: employees due for an examination.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::store::Ledger;
use crate::workflows::compliance::HarmfulFactor;
use crate::workflows::directory::{clinics_available_to, Employee};
use crate::workflows::documents::{Gender, RosterContent, RosterEntry};
use crate::workflows::examinations::{ExaminationKind, ExaminationStatus, MedicalExamination};
use crate::workflows::ids::OrganizationId;

pub(crate) const UNSPECIFIED_POSITION: &str = "Not specified";

/// Birth date encoded in the first six national id digits (`YYMMDD`).
/// A leading digit of 5 or more puts the year in the 1900s.
pub fn birth_date_from_national_id(national_id: &str) -> Option<NaiveDate> {
    let digits = national_id.get(0..6)?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let yy: i32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let day: u32 = digits[4..6].parse().ok()?;
    let century = if yy / 10 >= 5 { 1900 } else { 2000 };
    NaiveDate::from_ymd_opt(century + yy, month, day)
}

/// Seventh national id digit: even is female, odd is male.
pub fn gender_from_national_id(national_id: &str) -> Option<Gender> {
    let digit = national_id.chars().nth(6)?.to_digit(10)?;
    Some(if digit % 2 == 0 {
        Gender::Female
    } else {
        Gender::Male
    })
}

/// Tenure as `"Y y. M m."`, or `"M m."` under a year. Years are 365 days, months 30.
pub fn tenure_label(hired: NaiveDate, today: NaiveDate) -> String {
    let days = (today - hired).num_days().max(0);
    let years = days / 365;
    let months = (days % 365) / 30;
    if years > 0 {
        format!("{years} y. {months} m.")
    } else {
        format!("{months} m.")
    }
}

fn completed<'a>(
    ledger: &'a Ledger,
    employee: &Employee,
) -> impl Iterator<Item = &'a MedicalExamination> + 'a {
    ledger
        .examinations_of(employee.id)
        .filter(|examination| examination.status() == ExaminationStatus::Completed)
}

/// An employee is due when a factor was never examined, a factor's periodicity has run out,
/// or no periodic examination was completed during `year`.
pub fn needs_examination(
    ledger: &Ledger,
    employee: &Employee,
    factors: &[&HarmfulFactor],
    year: i32,
    today: NaiveDate,
) -> bool {
    for factor in factors {
        let last_examined = completed(ledger, employee)
            .filter(|examination| {
                examination
                    .doctor_examinations
                    .iter()
                    .any(|record| record.factor_id == factor.id)
            })
            .filter_map(MedicalExamination::completed_at)
            .max();
        let Some(last_examined) = last_examined else {
            return true;
        };
        let months_passed = (today - last_examined.date_naive()).num_days().max(0) / 30;
        if months_passed >= i64::from(factor.periodicity_months) {
            return true;
        }
    }

    !completed(ledger, employee).any(|examination| {
        examination.kind == ExaminationKind::Periodic
            && examination
                .completed_at()
                .map_or(false, |at| at.year() == year)
    })
}

/// Builds the roster content. Employees without a profession or without active factors
/// are left out: their factors are what decides the examination.
pub(crate) fn build_roster(
    ledger: &Ledger,
    employer: OrganizationId,
    year: i32,
    now: DateTime<Utc>,
) -> RosterContent {
    let today = now.date_naive();
    let catalog = ledger.catalog();

    let employees: Vec<RosterEntry> = ledger
        .employees_of(employer)
        .filter(|employee| employee.is_active)
        .filter_map(|employee| {
            let profession = catalog.profession(employee.position?)?;
            let factors = catalog.active_factors_of(profession);
            if factors.is_empty() || !needs_examination(ledger, employee, &factors, year, today) {
                return None;
            }

            let tenure = employee
                .hire_date
                .map(|hired| tenure_label(hired, today))
                .unwrap_or_else(|| "-".to_string());
            let last_examination_date = completed(ledger, employee)
                .filter_map(MedicalExamination::completed_at)
                .max();
            let harmful_factors = factors
                .iter()
                .map(|factor| factor.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");

            Some(RosterEntry {
                id: employee.id,
                full_name: employee.full_name(),
                date_of_birth: birth_date_from_national_id(&employee.national_id),
                gender: gender_from_national_id(&employee.national_id),
                department: employee
                    .department
                    .clone()
                    .filter(|department| !department.trim().is_empty())
                    .unwrap_or_else(|| "-".to_string()),
                position: profession.name.clone(),
                total_experience: tenure.clone(),
                position_experience: tenure,
                last_examination_date,
                harmful_factors,
                notes: employee.notes.clone().unwrap_or_default(),
                national_id: employee.national_id.clone(),
            })
        })
        .collect();

    RosterContent {
        total_count: employees.len(),
        employees,
        generated_at: now,
        available_clinics_for_calendar_plan: clinics_available_to(ledger, employer, now),
    }
}
