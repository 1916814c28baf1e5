use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{ExaminationRoute, RouteAssignment};
use crate::workflows::directory::{StaffMember, StaffRole};

/// Who may render the final disposition when a clinic has no dedicated final reviewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalReviewerPolicy {
    /// Only members holding the final reviewer role.
    StrictRoleAssignment,
    /// Final reviewers first, otherwise the first active doctor.
    #[default]
    FallbackToAnyActiveDoctor,
}

impl FinalReviewerPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" | "strict_role_assignment" => Some(Self::StrictRoleAssignment),
            "fallback" | "fallback_to_any_active_doctor" => Some(Self::FallbackToAnyActiveDoctor),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FinalReviewerPolicy::StrictRoleAssignment => "strict",
            FinalReviewerPolicy::FallbackToAnyActiveDoctor => "fallback",
        }
    }

    pub fn permits(self, member: &StaffMember) -> bool {
        if !member.is_active {
            return false;
        }
        match member.role {
            StaffRole::FinalReviewer => true,
            StaffRole::Doctor => self == Self::FallbackToAnyActiveDoctor,
            _ => false,
        }
    }

    /// Picks the final reviewer among a clinic's staff, lowest member id first.
    pub fn resolve<'a>(self, staff: &[&'a StaffMember]) -> Option<&'a StaffMember> {
        let mut candidates: Vec<&StaffMember> =
            staff.iter().copied().filter(|member| member.is_active).collect();
        candidates.sort_by_key(|member| member.id);

        candidates
            .iter()
            .find(|member| member.role == StaffRole::FinalReviewer)
            .or_else(|| match self {
                Self::StrictRoleAssignment => None,
                Self::FallbackToAnyActiveDoctor => candidates
                    .iter()
                    .find(|member| member.role == StaffRole::Doctor),
            })
            .copied()
    }
}

/// Doctors whose specialization one of the factors requires, then the final reviewer.
pub fn build_route(
    staff: &[&StaffMember],
    required_specializations: &BTreeSet<String>,
    policy: FinalReviewerPolicy,
) -> ExaminationRoute {
    let mut doctors: Vec<&StaffMember> = staff
        .iter()
        .copied()
        .filter(|member| member.is_active && member.role == StaffRole::Doctor)
        .filter(|member| {
            required_specializations
                .iter()
                .any(|wanted| member.has_specialization(wanted))
        })
        .collect();
    doctors.sort_by_key(|member| member.id);

    let mut route = ExaminationRoute::default();
    for doctor in doctors {
        route.push(RouteAssignment {
            member_id: doctor.id,
            role: StaffRole::Doctor,
            specialization: doctor.specialization.clone(),
        });
    }

    if let Some(reviewer) = policy.resolve(staff) {
        route.push(RouteAssignment {
            member_id: reviewer.id,
            role: StaffRole::FinalReviewer,
            specialization: reviewer.specialization.clone(),
        });
    }

    route
}
