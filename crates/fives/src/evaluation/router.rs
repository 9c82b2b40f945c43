use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::domain::{CompanyId, EvaluationId, PhotoPayload, WorkspaceId};
use super::orchestrator::EvaluationError;
use super::repository::{EvaluationRepository, RepositoryError};
use super::service::{
    EvaluationService, EvaluationServiceError, WorkspaceRegistration, WorkspaceUpdate,
};

/// Body of an evaluation request. Entries are untrusted and may be any JSON.
#[derive(Debug, Default, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub photos: Vec<Value>,
}

/// Router builder exposing workspace registration, evaluation and history.
pub fn evaluation_router<R>(service: Arc<EvaluationService<R>>) -> Router
where
    R: EvaluationRepository + 'static,
{
    Router::new()
        .route("/api/v1/workspaces", post(register_handler::<R>))
        .route(
            "/api/v1/workspaces/:workspace_id",
            get(workspace_handler::<R>)
                .put(update_workspace_handler::<R>)
                .delete(delete_workspace_handler::<R>),
        )
        .route(
            "/api/v1/companies/:company_id/workspaces",
            get(list_workspaces_handler::<R>),
        )
        .route(
            "/api/v1/workspaces/:workspace_id/evaluations",
            post(evaluate_handler::<R>),
        )
        .route(
            "/api/v1/workspaces/:workspace_id/trend",
            get(trend_handler::<R>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id",
            get(evaluation_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    payload: Result<axum::Json<WorkspaceRegistration>, JsonRejection>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let result = json_body(payload).and_then(|registration| {
        service.register_workspace(registration)
    });
    match result {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn workspace_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(workspace_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.workspace(&WorkspaceId(workspace_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn update_workspace_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(workspace_id): Path<String>,
    payload: Result<axum::Json<WorkspaceUpdate>, JsonRejection>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let id = WorkspaceId(workspace_id);
    let result = json_body(payload).and_then(|update| service.update_workspace(&id, update));
    match result {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn delete_workspace_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(workspace_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.delete_workspace(&WorkspaceId(workspace_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn list_workspaces_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(company_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.workspaces(&CompanyId(company_id)) {
        Ok(workspaces) => (StatusCode::OK, axum::Json(workspaces)).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn evaluate_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(workspace_id): Path<String>,
    payload: Result<axum::Json<EvaluationRequest>, JsonRejection>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(err) => return error_response(&err),
    };
    let photos: Vec<PhotoPayload> = request.photos.iter().map(PhotoPayload::from_json).collect();
    match service.evaluate(&WorkspaceId(workspace_id), &photos).await {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn evaluation_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.get(&EvaluationId(evaluation_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn trend_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(workspace_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let id = WorkspaceId(workspace_id);
    match service.trend(&id) {
        Ok(points) => {
            let payload = json!({
                "workspace_id": id.0,
                "points": points,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// Unwraps a JSON body, turning axum's plain-text rejection into a service error.
fn json_body<T>(
    payload: Result<axum::Json<T>, JsonRejection>,
) -> Result<T, EvaluationServiceError> {
    payload
        .map(|axum::Json(value)| value)
        .map_err(|rejection| EvaluationServiceError::InvalidRequest(rejection.body_text()))
}

/// HTTP status for a service failure.
pub fn status_for(err: &EvaluationServiceError) -> StatusCode {
    match err {
        EvaluationServiceError::InvalidWorkspace(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EvaluationServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        EvaluationServiceError::Evaluation(EvaluationError::Input) => StatusCode::BAD_REQUEST,
        EvaluationServiceError::Evaluation(inner) if inner.is_exhausted_transient() => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        EvaluationServiceError::Evaluation(_) => StatusCode::BAD_GATEWAY,
        EvaluationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EvaluationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(err: &EvaluationServiceError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        error!(error = %err, status = status.as_u16(), "evaluation request failed");
    }
    let message = err.user_message();
    let payload = json!({
        "error": {
            "title": message.title,
            "description": message.description,
        }
    });
    (status, axum::Json(payload)).into_response()
}
