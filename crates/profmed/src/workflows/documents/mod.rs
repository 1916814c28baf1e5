//! Documents generated by the workflows and the OTP signature flow around them.

pub(crate) mod certificate;
mod content;
mod domain;
pub mod otp;
mod service;

#[cfg(test)]
mod tests;

pub use content::{
    CalendarPlanContent, CertificateClinic, CertificateContent, CertificateEmployee,
    CertificateEmployer, CertificateFinding, CertificateReviewer, DocumentContent,
    FinalActContent, FinalActEntry, FinalActStatistics, Gender, PlanSlot, RosterContent,
    RosterEntry, TransferEntry,
};
pub use domain::{
    Document, DocumentDraft, DocumentKind, DocumentSignature, DocumentStatus, SignatureAudit,
    SignerRole,
};
pub use service::DocumentService;
