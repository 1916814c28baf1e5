//! Persisted document payloads. Field names are part of the stored JSON contract.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::workflows::directory::AvailableClinic;
use crate::workflows::examinations::ExaminationResult;
use crate::workflows::ids::{EmployeeId, MemberId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DocumentContent {
    Roster(RosterContent),
    CalendarPlan(CalendarPlanContent),
    FinalAct(FinalActContent),
    Certificate(CertificateContent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

/// One row of the Appendix 3 roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub id: EmployeeId,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub department: String,
    pub position: String,
    pub total_experience: String,
    pub position_experience: String,
    pub last_examination_date: Option<DateTime<Utc>>,
    /// Comma-joined factor names.
    pub harmful_factors: String,
    pub notes: String,
    pub national_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterContent {
    pub employees: Vec<RosterEntry>,
    pub total_count: usize,
    pub generated_at: DateTime<Utc>,
    pub available_clinics_for_calendar_plan: Vec<AvailableClinic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSlot {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarPlanContent {
    /// Visit date (`YYYY-MM-DD`) to the employees expected that day.
    pub plan_data: BTreeMap<NaiveDate, Vec<PlanSlot>>,
    pub clinic_name: String,
    pub generated_at: DateTime<Utc>,
    /// Set when employees that did not fit the range were piled onto the end date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinalActStatistics {
    pub total_examined: usize,
    pub fit: usize,
    pub unfit: usize,
    pub limited: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalActEntry {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferEntry {
    pub employee_id: EmployeeId,
    pub full_name: String,
    pub position: String,
    pub recommendations: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalActContent {
    pub employer_name: String,
    pub clinic_name: String,
    pub year: i32,
    pub statistics: FinalActStatistics,
    /// Unfit employees referred for occupational disease follow-up.
    pub professional_diseases: Vec<FinalActEntry>,
    /// Employees with limitations recommended for a job transfer.
    pub transfer_needed: Vec<TransferEntry>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateEmployee {
    pub full_name: String,
    pub national_id: String,
    pub position: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateEmployer {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateClinic {
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateFinding {
    pub doctor: String,
    pub specialization: String,
    pub harmful_factor: String,
    pub result: String,
    pub findings: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateReviewer {
    pub member_id: MemberId,
    pub full_name: String,
    pub phone: String,
}

/// Form 075/u medical certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateContent {
    pub employee: CertificateEmployee,
    pub employer: CertificateEmployer,
    pub clinic: CertificateClinic,
    pub examination_date: DateTime<Utc>,
    pub result: ExaminationResult,
    pub result_display: String,
    pub doctor_examinations: Vec<CertificateFinding>,
    pub final_reviewer: Option<CertificateReviewer>,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn calendar_plan_keys_are_iso_dates() {
        let mut plan_data = BTreeMap::new();
        plan_data.insert(
            NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
            vec![PlanSlot {
                employee_id: EmployeeId(7),
                full_name: "Bekov Arman".into(),
                position: "Miner".into(),
            }],
        );
        let content = DocumentContent::CalendarPlan(CalendarPlanContent {
            plan_data,
            clinic_name: "City Clinic".into(),
            generated_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            overflow_date: None,
        });

        let value = serde_json::to_value(&content).expect("serialize plan");
        assert_eq!(
            value["plan_data"]["2025-03-03"],
            json!([{ "employee_id": 7, "full_name": "Bekov Arman", "position": "Miner" }])
        );
        assert!(value.get("overflow_date").is_none());
    }

    #[test]
    fn final_act_statistics_shape() {
        let content = FinalActContent {
            employer_name: "Steelworks".into(),
            clinic_name: "City Clinic".into(),
            year: 2025,
            statistics: FinalActStatistics {
                total_examined: 2,
                fit: 1,
                unfit: 0,
                limited: 1,
            },
            professional_diseases: Vec::new(),
            transfer_needed: Vec::new(),
            generated_at: Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(&content).expect("serialize act");
        assert_eq!(
            value["statistics"],
            json!({ "total_examined": 2, "fit": 1, "unfit": 0, "limited": 1 })
        );
    }
}
