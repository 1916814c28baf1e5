//! Examination state machine, routing through clinic staff, and the token lookup endpoint.

pub mod domain;
pub mod router;
pub mod routing;
mod service;


pub use domain::{
    AccessToken, DoctorExamination, DoctorFindings, ExaminationKind, ExaminationProgress,
    ExaminationRequest, ExaminationResult, ExaminationRoute, ExaminationStatus,
    LaboratoryResult, LaboratoryResultInput, MedicalExamination, RouteAssignment,
};
pub use router::examination_router;
pub use routing::{build_route, FinalReviewerPolicy};
pub(crate) use service::create_in_ledger;
pub use service::{CompletedExamination, ExaminationService, FrontDeskView, RecordedFindings};
