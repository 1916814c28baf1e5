use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{Partnership, PartnershipStatus};
use crate::notifications::NotificationSender;
use crate::store::{Ledger, WorkflowStore};
use crate::workflows::context::WorkflowContext;
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{OrganizationId, PartnershipId};

/// A clinic an employer may schedule examinations with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableClinic {
    pub id: OrganizationId,
    pub name: String,
    pub partnership_id: PartnershipId,
}

/// Clinics with an active partnership with the employer, plus active public clinics.
pub fn clinics_available_to(
    ledger: &Ledger,
    employer: OrganizationId,
    now: DateTime<Utc>,
) -> Vec<AvailableClinic> {
    let mut by_clinic: BTreeMap<OrganizationId, PartnershipId> = BTreeMap::new();
    for partnership in ledger.partnerships().filter(|p| p.is_active(now)) {
        if partnership.employer_id == employer {
            by_clinic.insert(partnership.clinic_id, partnership.id);
        } else if partnership.is_public {
            by_clinic.entry(partnership.clinic_id).or_insert(partnership.id);
        }
    }

    let mut clinics: Vec<AvailableClinic> = by_clinic
        .into_iter()
        .filter_map(|(clinic_id, partnership_id)| {
            ledger.organization(clinic_id).map(|clinic| AvailableClinic {
                id: clinic_id,
                name: clinic.name.clone(),
                partnership_id,
            })
        })
        .collect();
    clinics.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    clinics
}

/// Terms a clinic sets when confirming a partnership.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnershipTerms {
    #[serde(default)]
    pub default_price: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_public: bool,
}

/// Clinic/employer partnership lifecycle.
pub struct PartnershipService<S, N> {
    ctx: WorkflowContext<S, N>,
}

impl<S, N> PartnershipService<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(ctx: WorkflowContext<S, N>) -> Self {
        Self { ctx }
    }

    /// Employer asks a clinic to serve it. Rejected or expired pairs may ask again.
    pub fn request_partnership(
        &self,
        employer_id: OrganizationId,
        clinic_id: OrganizationId,
        default_price: u64,
    ) -> Result<Partnership, WorkflowError> {
        let now = self.ctx.now();
        self.ctx.transaction("request_partnership", |ledger, outbox| {
            let employer = ledger.require_employer(employer_id)?.clone();
            let clinic = ledger.require_clinic(clinic_id)?.clone();

            let existing = ledger
                .partnership_between(clinic_id, employer_id)
                .map(|partnership| (partnership.id, partnership.status));
            let id = match existing {
                Some((id, PartnershipStatus::Rejected | PartnershipStatus::Expired)) => id,
                Some((_, status)) => {
                    return Err(WorkflowError::Conflict(format!(
                        "partnership between {} and {} is already {}",
                        clinic.name,
                        employer.name,
                        status.label()
                    )))
                }
                None => PartnershipId(ledger.allocate_id()),
            };

            let partnership = Partnership {
                id,
                clinic_id,
                employer_id,
                status: PartnershipStatus::Pending,
                is_public: false,
                default_price,
                notes: None,
                requested_at: now,
                confirmed_at: None,
                expires_at: None,
            };
            ledger.insert_partnership(partnership.clone());

            outbox.queue(
                &clinic.owner.phone,
                "partnership_requested",
                format!(
                    "New partnership request from {employer}\n\nEmployer: {employer}\nProposed price: {default_price}\n\nSign in to confirm.",
                    employer = employer.name,
                ),
            );
            Ok(partnership)
        })
    }

    pub fn confirm_partnership(
        &self,
        id: PartnershipId,
        terms: PartnershipTerms,
    ) -> Result<Partnership, WorkflowError> {
        let now = self.ctx.now();
        if matches!(terms.expires_at, Some(expires) if expires <= now) {
            return Err(WorkflowError::Validation(
                "partnership expiry must lie in the future".to_string(),
            ));
        }

        let confirmed = self.ctx.transaction("confirm_partnership", |ledger, outbox| {
            let partnership = ledger.partnership_mut(id)?;
            if !matches!(
                partnership.status,
                PartnershipStatus::Pending | PartnershipStatus::Suspended
            ) {
                return Err(invalid_transition(partnership.status, "confirm"));
            }
            partnership.status = PartnershipStatus::Active;
            partnership.confirmed_at = Some(now);
            partnership.expires_at = terms.expires_at;
            partnership.is_public = terms.is_public;
            partnership.notes = terms.notes.clone();
            if let Some(price) = terms.default_price {
                partnership.default_price = price;
            }
            let partnership = partnership.clone();

            let clinic = ledger.require_clinic(partnership.clinic_id)?;
            let employer = ledger.require_employer(partnership.employer_id)?;
            outbox.queue(
                &employer.owner.phone,
                "partnership_confirmed",
                format!(
                    "Partnership with clinic {} confirmed!\n\nPrice: {}\nYou can now schedule examinations with this clinic.",
                    clinic.name, partnership.default_price
                ),
            );
            Ok(partnership)
        })?;

        info!(partnership = %confirmed.id, "partnership confirmed");
        Ok(confirmed)
    }

    pub fn reject_partnership(&self, id: PartnershipId) -> Result<Partnership, WorkflowError> {
        self.transition(id, "reject", PartnershipStatus::Pending, PartnershipStatus::Rejected)
    }

    pub fn suspend_partnership(&self, id: PartnershipId) -> Result<Partnership, WorkflowError> {
        self.transition(id, "suspend", PartnershipStatus::Active, PartnershipStatus::Suspended)
    }

    fn transition(
        &self,
        id: PartnershipId,
        action: &'static str,
        from: PartnershipStatus,
        to: PartnershipStatus,
    ) -> Result<Partnership, WorkflowError> {
        self.ctx.transaction(action, |ledger, _outbox| {
            let partnership = ledger.partnership_mut(id)?;
            if partnership.status != from {
                return Err(invalid_transition(partnership.status, action));
            }
            partnership.status = to;
            Ok(partnership.clone())
        })
    }

    /// Flags active partnerships whose expiry has passed. Returns how many changed.
    pub fn expire_stale_partnerships(&self) -> Result<usize, WorkflowError> {
        let now = self.ctx.now();
        let expired = self.ctx.transaction("expire_partnerships", |ledger, _outbox| {
            let mut expired = 0;
            for partnership in ledger.partnerships_mut() {
                let lapsed = partnership.status == PartnershipStatus::Active
                    && partnership.expires_at.map_or(false, |expires| expires <= now);
                if lapsed {
                    partnership.status = PartnershipStatus::Expired;
                    expired += 1;
                }
            }
            Ok(expired)
        })?;
        if expired > 0 {
            info!(expired, "partnerships expired");
        }
        Ok(expired)
    }

    pub fn clinics_serving(
        &self,
        employer_id: OrganizationId,
    ) -> Result<Vec<AvailableClinic>, WorkflowError> {
        let now = self.ctx.now();
        self.ctx.read(|ledger| {
            ledger.require_employer(employer_id)?;
            Ok(clinics_available_to(ledger, employer_id, now))
        })
    }

    pub fn partnership(&self, id: PartnershipId) -> Result<Partnership, WorkflowError> {
        self.ctx.read(|ledger| {
            ledger
                .partnership(id)
                .cloned()
                .ok_or_else(|| WorkflowError::not_found("partnership", id))
        })
    }
}

fn invalid_transition(status: PartnershipStatus, action: &'static str) -> WorkflowError {
    WorkflowError::InvalidState {
        entity: "partnership",
        status: status.label(),
        action,
    }
}
