use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::DocumentContent;
use crate::workflows::directory::UserRef;
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{DocumentId, ExaminationId, OrganizationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Appendix 3: employees subject to examination.
    #[serde(rename = "appendix_3")]
    Roster,
    CalendarPlan,
    FinalAct,
    MedicalCertificate,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Roster => "appendix_3",
            DocumentKind::CalendarPlan => "calendar_plan",
            DocumentKind::FinalAct => "final_act",
            DocumentKind::MedicalCertificate => "medical_certificate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    PendingSignature,
    Signed,
    Approved,
}

impl DocumentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::PendingSignature => "pending_signature",
            DocumentStatus::Signed => "signed",
            DocumentStatus::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub organization_id: OrganizationId,
    pub clinic_id: Option<OrganizationId>,
    pub examination_id: Option<ExaminationId>,
    pub kind: DocumentKind,
    pub title: String,
    pub year: i32,
    pub content: DocumentContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    status: DocumentStatus,
}

/// Fields for a document about to be stored.
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    pub organization_id: OrganizationId,
    pub clinic_id: Option<OrganizationId>,
    pub examination_id: Option<ExaminationId>,
    pub kind: DocumentKind,
    pub title: String,
    pub year: i32,
    pub content: DocumentContent,
    pub status: DocumentStatus,
}

impl Document {
    pub(crate) fn from_draft(id: DocumentId, draft: DocumentDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            organization_id: draft.organization_id,
            clinic_id: draft.clinic_id,
            examination_id: draft.examination_id,
            kind: draft.kind,
            title: draft.title,
            year: draft.year,
            content: draft.content,
            created_at: now,
            updated_at: now,
            status: draft.status,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    fn reject(&self, action: &'static str) -> WorkflowError {
        WorkflowError::InvalidState {
            entity: "document",
            status: self.status.label(),
            action,
        }
    }

    /// Signed and approved content is frozen. The status never moves back.
    pub(crate) fn replace_content(
        &mut self,
        title: String,
        clinic_id: Option<OrganizationId>,
        content: DocumentContent,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if !self.is_open() {
            return Err(self.reject("regenerate"));
        }
        self.title = title;
        self.clinic_id = clinic_id;
        self.content = content;
        self.updated_at = now;
        Ok(())
    }

    pub(crate) fn await_signatures(&mut self, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        match self.status {
            DocumentStatus::Draft => {
                self.status = DocumentStatus::PendingSignature;
                self.updated_at = now;
                Ok(())
            }
            DocumentStatus::PendingSignature => Ok(()),
            DocumentStatus::Signed | DocumentStatus::Approved => {
                Err(self.reject("request a signature for"))
            }
        }
    }

    fn is_open(&self) -> bool {
        matches!(
            self.status,
            DocumentStatus::Draft | DocumentStatus::PendingSignature
        )
    }

    pub(crate) fn mark_signed(&mut self, now: DateTime<Utc>) {
        if self.is_open() {
            self.status = DocumentStatus::Signed;
            self.updated_at = now;
        }
    }

    pub(crate) fn approve(&mut self, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if self.status != DocumentStatus::Signed {
            return Err(self.reject("approve"));
        }
        self.status = DocumentStatus::Approved;
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    Clinic,
    Employer,
    /// Sanitary-epidemiological authority.
    Regulator,
}

impl SignerRole {
    pub const fn label(self) -> &'static str {
        match self {
            SignerRole::Clinic => "clinic",
            SignerRole::Employer => "employer",
            SignerRole::Regulator => "regulator",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSignature {
    pub document_id: DocumentId,
    pub signer: UserRef,
    pub role: SignerRole,
    #[serde(skip_serializing)]
    pub(crate) otp_code: Option<String>,
    pub otp_sent_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl DocumentSignature {
    pub(crate) fn requested(document_id: DocumentId, signer: UserRef, role: SignerRole) -> Self {
        Self {
            document_id,
            signer,
            role,
            otp_code: None,
            otp_sent_at: None,
            verified: false,
            signed_at: None,
            ip_address: None,
            user_agent: None,
        }
    }
}

/// Request metadata stored with a signature.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureAudit {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}
