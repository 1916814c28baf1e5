use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::workflows::compliance::ReferenceCatalog;
use crate::workflows::directory::{
    Employee, NewEmployee, Organization, OrganizationKind, Partnership, StaffMember, StaffRole,
    UserRef,
};
use crate::workflows::documents::{
    Document, DocumentDraft, DocumentKind, DocumentSignature, SignerRole,
};
use crate::workflows::error::WorkflowError;
use crate::workflows::examinations::{AccessToken, MedicalExamination};
use crate::workflows::ids::{
    DocumentId, EmployeeId, ExaminationId, MemberId, OrganizationId, PartnershipId,
};
use crate::workflows::scheduling::CalendarPlan;

/// Every entity the workflows own, committed as one unit.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    organizations: BTreeMap<OrganizationId, Organization>,
    members: BTreeMap<MemberId, StaffMember>,
    employees: BTreeMap<EmployeeId, Employee>,
    partnerships: BTreeMap<PartnershipId, Partnership>,
    catalog: ReferenceCatalog,
    examinations: BTreeMap<ExaminationId, MedicalExamination>,
    documents: BTreeMap<DocumentId, Document>,
    signatures: BTreeMap<(DocumentId, SignerRole), DocumentSignature>,
    calendar_plans: BTreeMap<(OrganizationId, i32), CalendarPlan>,
    next_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewEmployer {
    pub name: String,
    pub owner: UserRef,
}

#[derive(Debug, Clone)]
pub struct NewClinic {
    pub name: String,
    pub address: Option<String>,
    pub owner: UserRef,
    pub capacity_per_day: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NewStaffMember {
    pub organization_id: OrganizationId,
    pub user: UserRef,
    pub full_name: String,
    pub role: StaffRole,
    pub specialization: Option<String>,
}

impl Ledger {
    pub fn with_catalog(catalog: ReferenceCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub(crate) fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // Directory seeding.

    pub fn add_employer(&mut self, employer: NewEmployer) -> Result<OrganizationId, WorkflowError> {
        self.add_organization(employer.name, OrganizationKind::Employer, None, employer.owner, None)
    }

    pub fn add_clinic(&mut self, clinic: NewClinic) -> Result<OrganizationId, WorkflowError> {
        self.add_organization(
            clinic.name,
            OrganizationKind::Clinic,
            clinic.address,
            clinic.owner,
            clinic.capacity_per_day,
        )
    }

    fn add_organization(
        &mut self,
        name: String,
        kind: OrganizationKind,
        address: Option<String>,
        owner: UserRef,
        capacity_per_day: Option<u32>,
    ) -> Result<OrganizationId, WorkflowError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(WorkflowError::Validation(
                "organization name is required".to_string(),
            ));
        }
        let id = OrganizationId(self.allocate_id());
        self.organizations.insert(
            id,
            Organization {
                id,
                name,
                kind,
                address,
                owner,
                capacity_per_day,
            },
        );
        Ok(id)
    }

    pub fn add_staff_member(&mut self, member: NewStaffMember) -> Result<MemberId, WorkflowError> {
        self.require_organization(member.organization_id)?;
        let already_member = self.members.values().any(|existing| {
            existing.organization_id == member.organization_id && existing.user.id == member.user.id
        });
        if already_member {
            return Err(WorkflowError::Conflict(format!(
                "user {} already belongs to {}",
                member.user.id, member.organization_id
            )));
        }

        let id = MemberId(self.allocate_id());
        self.members.insert(
            id,
            StaffMember {
                id,
                organization_id: member.organization_id,
                user: member.user,
                full_name: member.full_name,
                role: member.role,
                specialization: member
                    .specialization
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty()),
                is_active: true,
            },
        );
        Ok(id)
    }

    pub fn set_member_active(&mut self, id: MemberId, active: bool) -> Result<(), WorkflowError> {
        let member = self
            .members
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("staff member", id))?;
        member.is_active = active;
        Ok(())
    }

    pub fn add_employee(&mut self, employee: NewEmployee) -> Result<EmployeeId, WorkflowError> {
        self.require_employer(employee.employer_id)?;
        if employee.first_name.trim().is_empty() || employee.last_name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "employee first and last name are required".to_string(),
            ));
        }
        let national_id = employee.national_id.trim().to_string();
        if national_id.is_empty() || !national_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(WorkflowError::Validation(format!(
                "national id '{}' must be digits only",
                employee.national_id
            )));
        }
        if let Some(position) = employee.position {
            if self.catalog.profession(position).is_none() {
                return Err(WorkflowError::not_found("profession", position));
            }
        }

        let id = EmployeeId(self.allocate_id());
        self.employees.insert(
            id,
            Employee {
                id,
                employer_id: employee.employer_id,
                first_name: employee.first_name.trim().to_string(),
                last_name: employee.last_name.trim().to_string(),
                middle_name: employee.middle_name,
                national_id,
                position: employee.position,
                department: employee.department,
                hire_date: employee.hire_date,
                notes: employee.notes,
                phone: employee.phone,
                is_active: true,
            },
        );
        Ok(id)
    }

    pub fn employee_mut(&mut self, id: EmployeeId) -> Result<&mut Employee, WorkflowError> {
        self.employees
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("employee", id))
    }

    /// Employees are never removed; examinations keep pointing at them.
    pub fn deactivate_employee(&mut self, id: EmployeeId) -> Result<(), WorkflowError> {
        self.employee_mut(id)?.is_active = false;
        Ok(())
    }

    // Lookups.

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ReferenceCatalog {
        &mut self.catalog
    }

    pub fn organization(&self, id: OrganizationId) -> Option<&Organization> {
        self.organizations.get(&id)
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> + '_ {
        self.organizations.values()
    }

    pub fn member(&self, id: MemberId) -> Option<&StaffMember> {
        self.members.get(&id)
    }

    pub fn active_staff(&self, organization: OrganizationId) -> Vec<&StaffMember> {
        self.members
            .values()
            .filter(|member| member.organization_id == organization && member.is_active)
            .collect()
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(&id)
    }

    pub fn employees_of(&self, employer: OrganizationId) -> impl Iterator<Item = &Employee> + '_ {
        self.employees
            .values()
            .filter(move |employee| employee.employer_id == employer)
    }

    pub fn examination(&self, id: ExaminationId) -> Option<&MedicalExamination> {
        self.examinations.get(&id)
    }

    pub fn examinations(&self) -> impl Iterator<Item = &MedicalExamination> + '_ {
        self.examinations.values()
    }

    pub fn examinations_of(
        &self,
        employee: EmployeeId,
    ) -> impl Iterator<Item = &MedicalExamination> + '_ {
        self.examinations
            .values()
            .filter(move |examination| examination.employee_id == employee)
    }

    pub fn examination_by_token(&self, token: &str) -> Option<&MedicalExamination> {
        self.examinations
            .values()
            .find(|examination| examination.access_token.as_str() == token)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> + '_ {
        self.documents.values()
    }

    /// The single document of an upserted kind (roster, calendar plan) for an organization and year.
    pub fn yearly_document(
        &self,
        organization: OrganizationId,
        kind: DocumentKind,
        year: i32,
    ) -> Option<&Document> {
        self.documents.values().find(|document| {
            document.organization_id == organization && document.kind == kind && document.year == year
        })
    }

    pub fn certificate_for(&self, examination: ExaminationId) -> Option<&Document> {
        self.documents.values().find(|document| {
            document.kind == DocumentKind::MedicalCertificate
                && document.examination_id == Some(examination)
        })
    }

    pub fn signature(&self, document: DocumentId, role: SignerRole) -> Option<&DocumentSignature> {
        self.signatures.get(&(document, role))
    }

    pub fn signatures_for(&self, document: DocumentId) -> Vec<&DocumentSignature> {
        self.signatures
            .range((document, SignerRole::Clinic)..=(document, SignerRole::Regulator))
            .map(|(_, signature)| signature)
            .collect()
    }

    pub fn partnership(&self, id: PartnershipId) -> Option<&Partnership> {
        self.partnerships.get(&id)
    }

    pub fn partnerships(&self) -> impl Iterator<Item = &Partnership> + '_ {
        self.partnerships.values()
    }

    pub fn partnership_between(
        &self,
        clinic: OrganizationId,
        employer: OrganizationId,
    ) -> Option<&Partnership> {
        self.partnerships
            .values()
            .find(|partnership| partnership.clinic_id == clinic && partnership.employer_id == employer)
    }

    pub fn calendar_plan(&self, employer: OrganizationId, year: i32) -> Option<&CalendarPlan> {
        self.calendar_plans.get(&(employer, year))
    }

    // Lookups that must succeed.

    pub fn require_organization(&self, id: OrganizationId) -> Result<&Organization, WorkflowError> {
        self.organization(id)
            .ok_or_else(|| WorkflowError::not_found("organization", id))
    }

    pub fn require_employer(&self, id: OrganizationId) -> Result<&Organization, WorkflowError> {
        self.require_kind(id, OrganizationKind::Employer)
    }

    pub fn require_clinic(&self, id: OrganizationId) -> Result<&Organization, WorkflowError> {
        self.require_kind(id, OrganizationKind::Clinic)
    }

    fn require_kind(
        &self,
        id: OrganizationId,
        kind: OrganizationKind,
    ) -> Result<&Organization, WorkflowError> {
        self.organization(id)
            .filter(|organization| organization.kind == kind)
            .ok_or_else(|| WorkflowError::not_found(kind.label(), id))
    }

    pub fn require_member(&self, id: MemberId) -> Result<&StaffMember, WorkflowError> {
        self.member(id)
            .ok_or_else(|| WorkflowError::not_found("staff member", id))
    }

    pub fn require_employee(&self, id: EmployeeId) -> Result<&Employee, WorkflowError> {
        self.employee(id)
            .ok_or_else(|| WorkflowError::not_found("employee", id))
    }

    pub fn require_examination(
        &self,
        id: ExaminationId,
    ) -> Result<&MedicalExamination, WorkflowError> {
        self.examination(id)
            .ok_or_else(|| WorkflowError::not_found("examination", id))
    }

    pub fn require_document(&self, id: DocumentId) -> Result<&Document, WorkflowError> {
        self.document(id)
            .ok_or_else(|| WorkflowError::not_found("document", id))
    }

    // Workflow mutations.

    pub(crate) fn examination_mut(
        &mut self,
        id: ExaminationId,
    ) -> Result<&mut MedicalExamination, WorkflowError> {
        self.examinations
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("examination", id))
    }

    /// Access tokens are unique across the ledger, not just likely unique.
    pub(crate) fn fresh_access_token(&self) -> AccessToken {
        loop {
            let token = AccessToken::generate();
            if self.examination_by_token(token.as_str()).is_none() {
                return token;
            }
        }
    }

    pub(crate) fn insert_examination(
        &mut self,
        examination: MedicalExamination,
    ) -> Result<(), WorkflowError> {
        if self
            .examination_by_token(examination.access_token.as_str())
            .is_some()
        {
            return Err(WorkflowError::Conflict(
                "access token already issued".to_string(),
            ));
        }
        self.examinations.insert(examination.id, examination);
        Ok(())
    }

    pub(crate) fn insert_document(&mut self, draft: DocumentDraft, now: DateTime<Utc>) -> DocumentId {
        let id = DocumentId(self.allocate_id());
        self.documents.insert(id, Document::from_draft(id, draft, now));
        id
    }

    /// Regenerates the (organization, kind, year) document in place, or creates it.
    /// Codes issued for the old content are dropped with it.
    pub(crate) fn upsert_yearly_document(
        &mut self,
        draft: DocumentDraft,
        now: DateTime<Utc>,
    ) -> Result<DocumentId, WorkflowError> {
        let existing = self
            .yearly_document(draft.organization_id, draft.kind, draft.year)
            .map(|document| document.id);
        let Some(id) = existing else {
            return Ok(self.insert_document(draft, now));
        };
        self.document_mut(id)?
            .replace_content(draft.title, draft.clinic_id, draft.content, now)?;
        self.signatures.retain(|(document_id, _), _| *document_id != id);
        Ok(id)
    }

    pub(crate) fn document_mut(&mut self, id: DocumentId) -> Result<&mut Document, WorkflowError> {
        self.documents
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("document", id))
    }

    pub(crate) fn remove_document(&mut self, id: DocumentId) -> Option<Document> {
        self.signatures.retain(|(document_id, _), _| *document_id != id);
        self.documents.remove(&id)
    }

    pub(crate) fn signature_mut(
        &mut self,
        document: DocumentId,
        role: SignerRole,
    ) -> Option<&mut DocumentSignature> {
        self.signatures.get_mut(&(document, role))
    }

    /// Returns the signature slot for (document, role), creating it for `signer` if absent.
    pub(crate) fn signature_slot(
        &mut self,
        document: DocumentId,
        role: SignerRole,
        signer: UserRef,
    ) -> &mut DocumentSignature {
        self.signatures
            .entry((document, role))
            .or_insert_with(|| DocumentSignature::requested(document, signer, role))
    }

    pub(crate) fn put_calendar_plan(&mut self, plan: CalendarPlan) {
        self.calendar_plans
            .insert((plan.employer_id, plan.year), plan);
    }

    pub(crate) fn take_calendar_plan(
        &mut self,
        employer: OrganizationId,
        year: i32,
    ) -> Option<CalendarPlan> {
        self.calendar_plans.remove(&(employer, year))
    }

    pub(crate) fn insert_partnership(&mut self, partnership: Partnership) {
        self.partnerships.insert(partnership.id, partnership);
    }

    pub(crate) fn partnership_mut(
        &mut self,
        id: PartnershipId,
    ) -> Result<&mut Partnership, WorkflowError> {
        self.partnerships
            .get_mut(&id)
            .ok_or_else(|| WorkflowError::not_found("partnership", id))
    }

    pub(crate) fn partnerships_mut(&mut self) -> impl Iterator<Item = &mut Partnership> + '_ {
        self.partnerships.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ids::UserId;

    fn owner(id: u64) -> UserRef {
        UserRef {
            id: UserId(id),
            phone: format!("+770100000{id:02}"),
        }
    }

    #[test]
    fn employees_require_an_employer() {
        let mut ledger = Ledger::default();
        let clinic = ledger
            .add_clinic(NewClinic {
                name: "City Clinic".into(),
                address: None,
                owner: owner(1),
                capacity_per_day: None,
            })
            .expect("clinic");

        let result = ledger.add_employee(NewEmployee {
            employer_id: clinic,
            first_name: "Arman".into(),
            last_name: "Bekov".into(),
            middle_name: None,
            national_id: "850101300123".into(),
            position: None,
            department: None,
            hire_date: None,
            notes: None,
            phone: None,
        });
        match result {
            Err(WorkflowError::NotFound { entity, .. }) => assert_eq!(entity, "employer"),
            other => panic!("expected missing employer, got {other:?}"),
        }
    }

    #[test]
    fn staff_membership_is_unique_per_organization() {
        let mut ledger = Ledger::default();
        let clinic = ledger
            .add_clinic(NewClinic {
                name: "City Clinic".into(),
                address: None,
                owner: owner(1),
                capacity_per_day: None,
            })
            .expect("clinic");
        let member = NewStaffMember {
            organization_id: clinic,
            user: owner(2),
            full_name: "Dr. Omarova".into(),
            role: StaffRole::Doctor,
            specialization: Some("therapist".into()),
        };
        ledger.add_staff_member(member.clone()).expect("first");
        assert!(matches!(
            ledger.add_staff_member(member),
            Err(WorkflowError::Conflict(_))
        ));
    }
}
