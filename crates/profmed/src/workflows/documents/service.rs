use tracing::info;

use super::certificate;
use super::domain::{Document, DocumentSignature, SignatureAudit, SignerRole};
use super::otp;
use crate::notifications::NotificationSender;
use crate::store::{Ledger, WorkflowStore};
use crate::workflows::context::WorkflowContext;
use crate::workflows::directory::UserRef;
use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{DocumentId, ExaminationId};

/// OTP signatures and document status.
pub struct DocumentService<S, N> {
    ctx: WorkflowContext<S, N>,
}

impl<S, N> DocumentService<S, N>
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    pub fn new(ctx: WorkflowContext<S, N>) -> Self {
        Self { ctx }
    }

    /// Sends a fresh one-time code to whoever signs for `role`. Asking again replaces the code.
    pub fn request_signature(
        &self,
        document_id: DocumentId,
        role: SignerRole,
    ) -> Result<DocumentSignature, WorkflowError> {
        let now = self.ctx.now();
        let settings = self.ctx.settings();

        let signature = self.ctx.transaction("request_signature", |ledger, outbox| {
            let signer = self.resolve_signer(ledger, document_id, role)?;
            if ledger
                .signature(document_id, role)
                .map_or(false, |existing| existing.verified)
            {
                return Err(WorkflowError::Conflict(format!(
                    "{document_id} is already signed by the {} signer",
                    role.label()
                )));
            }

            let document = ledger.document_mut(document_id)?;
            document.await_signatures(now)?;
            let title = document.title.clone();

            let code = otp::generate_code(settings.otp_length);
            let slot = ledger.signature_slot(document_id, role, signer.clone());
            slot.signer = signer;
            slot.otp_code = Some(code.clone());
            slot.otp_sent_at = Some(now);
            let signature = slot.clone();

            outbox.queue(
                &signature.signer.phone,
                "signature_code",
                format!(
                    "Code for signing document '{title}': {code}\nThe code is valid for {} minutes.",
                    settings.otp_ttl.num_minutes()
                ),
            );
            Ok(signature)
        })?;

        info!(document = %document_id, role = role.label(), "signature requested");
        Ok(signature)
    }

    /// Checks the code and stamps the signature. The document is signed once every
    /// requested signature is verified.
    pub fn verify_and_sign(
        &self,
        document_id: DocumentId,
        role: SignerRole,
        code: &str,
        audit: SignatureAudit,
    ) -> Result<DocumentSignature, WorkflowError> {
        let now = self.ctx.now();
        let ttl = self.ctx.settings().otp_ttl;

        let (signature, fully_signed) = self.ctx.transaction("verify_and_sign", |ledger, _outbox| {
            ledger.require_document(document_id)?;
            let slot = ledger
                .signature_mut(document_id, role)
                .ok_or_else(|| {
                    WorkflowError::not_found("signature", format!("{document_id}/{}", role.label()))
                })?;
            otp::verify(slot, code, now, ttl)?;

            slot.verified = true;
            slot.signed_at = Some(now);
            slot.otp_code = None;
            slot.ip_address = audit.ip_address.clone();
            slot.user_agent = audit.user_agent.clone();
            let signature = slot.clone();

            let signatures = ledger.signatures_for(document_id);
            let total = signatures.len();
            let verified = signatures.iter().filter(|signature| signature.verified).count();
            let fully_signed = total >= 1 && verified == total;
            if fully_signed {
                ledger.document_mut(document_id)?.mark_signed(now);
            }
            Ok((signature, fully_signed))
        })?;

        info!(
            document = %document_id,
            role = role.label(),
            fully_signed,
            "signature verified"
        );
        Ok(signature)
    }

    pub fn approve_document(&self, document_id: DocumentId) -> Result<Document, WorkflowError> {
        let now = self.ctx.now();
        let approved = self.ctx.transaction("approve_document", |ledger, _outbox| {
            let document = ledger.document_mut(document_id)?;
            document.approve(now)?;
            Ok(document.clone())
        })?;
        info!(document = %document_id, "document approved");
        Ok(approved)
    }

    /// Returns the examination's certificate, issuing it if it is missing.
    pub fn generate_medical_certificate(
        &self,
        examination_id: ExaminationId,
    ) -> Result<Document, WorkflowError> {
        let now = self.ctx.now();
        self.ctx.transaction("generate_medical_certificate", |ledger, _outbox| {
            let id = certificate::issue_in_ledger(ledger, examination_id, now)?;
            ledger.require_document(id).cloned()
        })
    }

    pub fn document(&self, document_id: DocumentId) -> Result<Document, WorkflowError> {
        self.ctx
            .read(|ledger| ledger.require_document(document_id).cloned())
    }

    pub fn signatures(&self, document_id: DocumentId) -> Result<Vec<DocumentSignature>, WorkflowError> {
        self.ctx.read(|ledger| {
            ledger.require_document(document_id)?;
            Ok(ledger
                .signatures_for(document_id)
                .into_iter()
                .cloned()
                .collect())
        })
    }

    fn resolve_signer(
        &self,
        ledger: &Ledger,
        document_id: DocumentId,
        role: SignerRole,
    ) -> Result<UserRef, WorkflowError> {
        let document = ledger.require_document(document_id)?;
        match role {
            SignerRole::Employer => Ok(ledger
                .require_organization(document.organization_id)?
                .owner
                .clone()),
            SignerRole::Clinic => {
                let organization = document.clinic_id.unwrap_or(document.organization_id);
                Ok(ledger.require_organization(organization)?.owner.clone())
            }
            SignerRole::Regulator => self.ctx.settings().regulator_signer.clone().ok_or_else(|| {
                WorkflowError::Validation("no regulator signer is configured".to_string())
            }),
        }
    }
}
