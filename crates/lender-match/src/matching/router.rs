use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{ApplicationId, ApplicationSubmission, Program, ProgramId};
use super::repository::{ApplicationRepository, ProgramCatalog, RepositoryError};
use super::service::{LenderMatchService, LenderMatchServiceError};

/// Router builder exposing intake, matching, and program catalog endpoints.
pub fn matching_router<R, C>(service: Arc<LenderMatchService<R, C>>) -> Router
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            get(list_applications_handler::<R, C>).post(submit_handler::<R, C>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(status_handler::<R, C>),
        )
        .route(
            "/api/v1/applications/:application_id/match",
            post(match_handler::<R, C>),
        )
        .route(
            "/api/v1/applications/:application_id/results",
            get(results_handler::<R, C>),
        )
        .route(
            "/api/v1/programs",
            get(list_programs_handler::<R, C>).post(register_program_handler::<R, C>),
        )
        .route(
            "/api/v1/programs/:program_id",
            get(program_handler::<R, C>)
                .put(update_program_handler::<R, C>)
                .delete(remove_program_handler::<R, C>),
        )
        .with_state(service)
}

fn error_response(error: LenderMatchServiceError) -> Response {
    let status = match &error {
        LenderMatchServiceError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LenderMatchServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LenderMatchServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        LenderMatchServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.submit(submission) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_applications_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.applications() {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn match_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    let id = ApplicationId(application_id);
    match service.run_matching(&id) {
        Ok(results) => {
            let eligible = results.iter().filter(|result| result.is_eligible).count();
            let payload = json!({
                "application_id": id.0,
                "status": "completed",
                "matches": results.len(),
                "eligible": eligible,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn results_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.results(&ApplicationId(application_id)) {
        Ok(results) => (StatusCode::OK, axum::Json(results)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_programs_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.programs() {
        Ok(programs) => (StatusCode::OK, axum::Json(programs)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn register_program_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    axum::Json(program): axum::Json<Program>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.register_program(program) {
        Ok(program) => (StatusCode::CREATED, axum::Json(program)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn program_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    Path(program_id): Path<u64>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.program(ProgramId(program_id)) {
        Ok(program) => (StatusCode::OK, axum::Json(program)).into_response(),
        Err(error) => error_response(error),
    }
}

/// The path id wins over any id carried in the body.
pub(crate) async fn update_program_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    Path(program_id): Path<u64>,
    axum::Json(mut program): axum::Json<Program>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    program.id = ProgramId(program_id);
    match service.update_program(program) {
        Ok(program) => (StatusCode::OK, axum::Json(program)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_program_handler<R, C>(
    State(service): State<Arc<LenderMatchService<R, C>>>,
    Path(program_id): Path<u64>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ProgramCatalog + 'static,
{
    match service.remove_program(ProgramId(program_id)) {
        Ok(program) => {
            let payload = json!({ "removed": program.id, "name": program.name });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
