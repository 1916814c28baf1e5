use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::store::RepositoryError;

/// Failure surfaced by any workflow operation. A failed operation commits nothing.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Malformed or missing input.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A prerequisite step has not been performed yet.
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("cannot {action} {entity} in status {status}")]
    InvalidState {
        entity: &'static str,
        status: &'static str,
        action: &'static str,
    },
    #[error("invalid verification code")]
    InvalidCode,
    #[error("verification code expired")]
    ExpiredCode,
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    /// The subscription gate refused the organization.
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::Precondition(_) => StatusCode::PRECONDITION_FAILED,
            WorkflowError::InvalidState { .. } | WorkflowError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            WorkflowError::InvalidCode | WorkflowError::ExpiredCode => StatusCode::UNAUTHORIZED,
            WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            WorkflowError::AccessDenied(_) => StatusCode::FORBIDDEN,
            WorkflowError::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_http_statuses() {
        assert_eq!(
            WorkflowError::Precondition("roster missing".into()).status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            WorkflowError::ExpiredCode.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WorkflowError::not_found("examination", "exam-000001").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn invalid_state_reads_naturally() {
        let err = WorkflowError::InvalidState {
            entity: "examination",
            status: "completed",
            action: "start",
        };
        assert_eq!(err.to_string(), "cannot start examination in status completed");
    }
}
