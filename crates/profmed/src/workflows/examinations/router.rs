use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::service::ExaminationService;
use crate::notifications::NotificationSender;
use crate::store::WorkflowStore;
use crate::workflows::ids::ExaminationId;

/// Front-desk endpoints: token lookup and examination progress.
pub fn examination_router<S, N>(service: Arc<ExaminationService<S, N>>) -> Router
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    Router::new()
        .route(
            "/api/v1/examinations/by-token/:token",
            get(token_handler::<S, N>),
        )
        .route(
            "/api/v1/examinations/:examination_id/progress",
            get(progress_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn token_handler<S, N>(
    State(service): State<Arc<ExaminationService<S, N>>>,
    Path(token): Path<String>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    match service.front_desk_view(&token) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn progress_handler<S, N>(
    State(service): State<Arc<ExaminationService<S, N>>>,
    Path(examination_id): Path<u64>,
) -> Response
where
    S: WorkflowStore + 'static,
    N: NotificationSender + 'static,
{
    match service.get_examination_progress(ExaminationId(examination_id)) {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(err) => err.into_response(),
    }
}
