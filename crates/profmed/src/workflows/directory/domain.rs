use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{EmployeeId, MemberId, OrganizationId, PartnershipId, ProfessionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationKind {
    Employer,
    Clinic,
}

impl OrganizationKind {
    pub const fn label(self) -> &'static str {
        match self {
            OrganizationKind::Employer => "employer",
            OrganizationKind::Clinic => "clinic",
        }
    }
}

/// A person who can receive messages and sign documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub kind: OrganizationKind,
    pub address: Option<String>,
    pub owner: UserRef,
    /// Examinations per day; clinics only.
    pub capacity_per_day: Option<u32>,
}

impl Organization {
    pub fn daily_capacity(&self, default: u32) -> u32 {
        self.capacity_per_day
            .filter(|capacity| *capacity > 0)
            .unwrap_or(default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Hr,
    Safety,
    Doctor,
    Registrar,
    /// Occupational pathologist rendering the final disposition.
    FinalReviewer,
}

impl StaffRole {
    pub const fn label(self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Hr => "hr",
            StaffRole::Safety => "safety",
            StaffRole::Doctor => "doctor",
            StaffRole::Registrar => "registrar",
            StaffRole::FinalReviewer => "final_reviewer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: MemberId,
    pub organization_id: OrganizationId,
    pub user: UserRef,
    pub full_name: String,
    pub role: StaffRole,
    pub specialization: Option<String>,
    pub is_active: bool,
}

impl StaffMember {
    pub fn has_specialization(&self, wanted: &str) -> bool {
        self.specialization
            .as_deref()
            .map(|own| own.trim().eq_ignore_ascii_case(wanted.trim()))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub employer_id: OrganizationId,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    /// Twelve-digit national identifier starting with the birth date as YYMMDD.
    pub national_id: String,
    pub position: Option<ProfessionId>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl Employee {
    pub fn full_name(&self) -> String {
        let middle = self.middle_name.as_deref().unwrap_or("");
        format!("{} {} {}", self.last_name, self.first_name, middle)
            .trim()
            .to_string()
    }
}

/// Input for registering an employee with an employer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    pub employer_id: OrganizationId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub national_id: String,
    #[serde(default)]
    pub position: Option<ProfessionId>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnershipStatus {
    Pending,
    Active,
    Rejected,
    Suspended,
    Expired,
}

impl PartnershipStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PartnershipStatus::Pending => "pending",
            PartnershipStatus::Active => "active",
            PartnershipStatus::Rejected => "rejected",
            PartnershipStatus::Suspended => "suspended",
            PartnershipStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partnership {
    pub id: PartnershipId,
    pub clinic_id: OrganizationId,
    pub employer_id: OrganizationId,
    pub status: PartnershipStatus,
    /// Public clinics serve any employer without an explicit agreement.
    pub is_public: bool,
    /// Per-examination price in whole currency units.
    pub default_price: u64,
    pub notes: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Partnership {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == PartnershipStatus::Active
            && self.expires_at.map_or(true, |expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn partnership(status: PartnershipStatus, expires_at: Option<DateTime<Utc>>) -> Partnership {
        Partnership {
            id: PartnershipId(1),
            clinic_id: OrganizationId(2),
            employer_id: OrganizationId(3),
            status,
            is_public: false,
            default_price: 0,
            notes: None,
            requested_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            confirmed_at: None,
            expires_at,
        }
    }

    #[test]
    fn partnership_activity_respects_status_and_expiry() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(partnership(PartnershipStatus::Active, None).is_active(now));
        assert!(partnership(PartnershipStatus::Active, Some(now + Duration::days(1))).is_active(now));
        assert!(!partnership(PartnershipStatus::Active, Some(now)).is_active(now));
        assert!(!partnership(PartnershipStatus::Pending, None).is_active(now));
    }

    #[test]
    fn full_name_skips_missing_middle_name() {
        let employee = Employee {
            id: EmployeeId(1),
            employer_id: OrganizationId(1),
            first_name: "Aigerim".into(),
            last_name: "Sadykova".into(),
            middle_name: None,
            national_id: "900101400123".into(),
            position: None,
            department: None,
            hire_date: None,
            notes: None,
            phone: None,
            is_active: true,
        };
        assert_eq!(employee.full_name(), "Sadykova Aigerim");
    }

    #[test]
    fn capacity_falls_back_to_default() {
        let mut clinic = Organization {
            id: OrganizationId(1),
            name: "City Clinic".into(),
            kind: OrganizationKind::Clinic,
            address: None,
            owner: UserRef {
                id: UserId(1),
                phone: "+77010000001".into(),
            },
            capacity_per_day: None,
        };
        assert_eq!(clinic.daily_capacity(50), 50);
        clinic.capacity_per_day = Some(0);
        assert_eq!(clinic.daily_capacity(50), 50);
        clinic.capacity_per_day = Some(2);
        assert_eq!(clinic.daily_capacity(50), 2);
    }
}
