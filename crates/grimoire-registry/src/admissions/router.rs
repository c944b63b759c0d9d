use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{RequestForm, RequestId, RequestPatch};
use super::repository::AdmissionRepository;
use super::service::{ErrorKind, RegistryError, RequestRegistry};
use super::validation::ValidationError;

/// Body accepted by the status route, e.g. `{"status": "approved"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

/// Router builder exposing the admission and assignment endpoints.
pub fn admission_router<R>(registry: Arc<RequestRegistry<R>>) -> Router
where
    R: AdmissionRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/requests",
            post(create_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/requests/:id",
            get(get_handler::<R>)
                .put(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route("/api/v1/requests/:id/status", patch(status_handler::<R>))
        .route("/api/v1/assignments", get(assignments_handler::<R>))
        .with_state(registry)
}

/// HTTP status used for each error class.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn error_response(error: RegistryError) -> Response {
    let kind = error.kind();
    // Storage details stay in the logs.
    let message = match kind {
        ErrorKind::Internal => "internal server error".to_string(),
        _ => error.to_string(),
    };
    let payload = json!({ "error": message });
    (status_for(kind), Json(payload)).into_response()
}

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RegistryError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ValidationError::Payload(rejection.body_text()).into())
}

pub(crate) async fn create_handler<R>(
    State(registry): State<Arc<RequestRegistry<R>>>,
    body: Result<Json<RequestForm>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match payload(body).and_then(|form| registry.create(form)) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(State(registry): State<Arc<RequestRegistry<R>>>) -> Response
where
    R: AdmissionRepository + 'static,
{
    match registry.list() {
        Ok(requests) => (StatusCode::OK, Json(requests)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R>(
    State(registry): State<Arc<RequestRegistry<R>>>,
    Path(id): Path<u64>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match registry.get(RequestId(id)) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R>(
    State(registry): State<Arc<RequestRegistry<R>>>,
    Path(id): Path<u64>,
    body: Result<Json<RequestPatch>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match payload(body).and_then(|patch| registry.update(RequestId(id), patch)) {
        Ok(request) => (StatusCode::OK, Json(request)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(registry): State<Arc<RequestRegistry<R>>>,
    Path(id): Path<u64>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match registry.delete(RequestId(id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": id }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R>(
    State(registry): State<Arc<RequestRegistry<R>>>,
    Path(id): Path<u64>,
    body: Result<Json<StatusChange>, JsonRejection>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match payload(body).and_then(|change| registry.set_status(RequestId(id), &change.status)) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assignments_handler<R>(
    State(registry): State<Arc<RequestRegistry<R>>>,
) -> Response
where
    R: AdmissionRepository + 'static,
{
    match registry.list_assignments() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}
