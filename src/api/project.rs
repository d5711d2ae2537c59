//! Project handlers.
//!
//! Every handler except create runs the ownership guard first, so another
//! user's project is indistinguishable from a missing one.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use super::dto::{
    CreateProjectRequest, MessageResponse, ProjectEnvelope, ProjectListEnvelope, ProjectResponse,
    UpdateProjectRequest,
};
use super::error::ApiErrorResponse;
use super::extract::{JsonBody, decode_json, parse_project_id};
use super::guard::{PROJECT_NOT_FOUND, verify_project_owner};
use super::handlers::AppState;
use super::identity::AuthenticatedUser;
use crate::domain::{Project, ProjectDetail, ProjectId};

/// Reloads a project that was just written.
///
/// A project that vanished between write and read is reported as a 500.
async fn reload_project(
    state: &AppState,
    project_id: &ProjectId,
) -> Result<ProjectDetail, ApiErrorResponse> {
    state
        .projects()
        .find_detail(project_id)
        .await?
        .ok_or_else(|| {
            tracing::error!(%project_id, "Project missing right after write");
            ApiErrorResponse::internal_error()
        })
}

fn envelope(message: &str, detail: &ProjectDetail) -> Json<ProjectEnvelope> {
    Json(ProjectEnvelope {
        message: message.to_string(),
        project: ProjectResponse::from(detail),
    })
}

/// Creates a project.
///
/// # Endpoint
///
/// `POST /api/projects`
///
/// The creator is taken from the `created_by` field of the body and must
/// reference an existing user.
///
/// # Errors
///
/// - `400 Bad Request`: invalid fields or an unknown `created_by`
/// - `500 Internal Server Error`: repository failure
pub async fn create_project(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    JsonBody(request): JsonBody<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectEnvelope>), ApiErrorResponse> {
    let new_project = request.validate()?;

    if state
        .users()
        .find_by_id(&new_project.created_by)
        .await?
        .is_none()
    {
        return Err(ApiErrorResponse::bad_request(
            "INVALID_CREATOR",
            "Provided created_by ID does not correspond to a valid user",
        ));
    }

    if new_project.created_by != caller {
        tracing::info!(
            caller = %caller,
            created_by = %new_project.created_by,
            "Project created on behalf of another user"
        );
    }

    let mut project = Project::new(
        ProjectId::generate_v7(),
        new_project.name,
        new_project.created_by,
        Utc::now(),
    );
    project.description = new_project.description;

    state.projects().insert(&project).await?;
    let detail = reload_project(&state, &project.project_id).await?;

    tracing::info!(project_id = %project.project_id, "Project created");

    Ok((
        StatusCode::CREATED,
        envelope("Project created successfully", &detail),
    ))
}

/// Lists the caller's projects, oldest first.
///
/// # Endpoint
///
/// `GET /api/projects`
///
/// # Errors
///
/// - `500 Internal Server Error`: repository failure
pub async fn list_projects(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<ProjectListEnvelope>, ApiErrorResponse> {
    let projects = state.projects().list_by_owner(&caller).await?;

    Ok(Json(ProjectListEnvelope {
        message: "Projects retrieved successfully".to_string(),
        projects: projects.iter().map(ProjectResponse::from).collect(),
    }))
}

/// Returns one of the caller's projects.
///
/// # Endpoint
///
/// `GET /api/projects/detail/{id}`
///
/// # Errors
///
/// - `400 Bad Request`: malformed ID
/// - `404 Not Found`: missing or owned by someone else
/// - `500 Internal Server Error`: repository failure
pub async fn get_project(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ProjectEnvelope>, ApiErrorResponse> {
    let project_id = parse_project_id(&raw_id)?;
    let project = verify_project_owner(&state, &project_id, &caller).await?;

    Ok(envelope("Project retrieved successfully", project.detail()))
}

/// Updates the name and/or description of one of the caller's projects.
///
/// # Endpoint
///
/// `PUT /api/projects/detail/{id}`
///
/// # Errors
///
/// The body is only decoded once the project is known to be the caller's.
///
/// - `400 Bad Request`: malformed ID or body, or a blank name
/// - `404 Not Found`: missing or owned by someone else
/// - `500 Internal Server Error`: repository failure
pub async fn update_project(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<ProjectEnvelope>, ApiErrorResponse> {
    let project_id = parse_project_id(&raw_id)?;
    let project = verify_project_owner(&state, &project_id, &caller).await?;
    let patch = decode_json::<UpdateProjectRequest>(&body)?.validate()?;

    if patch.is_empty() {
        return Ok(envelope("Project updated successfully", project.detail()));
    }

    if !state.projects().update(&project_id, &patch).await? {
        return Err(ApiErrorResponse::not_found(PROJECT_NOT_FOUND));
    }
    let detail = reload_project(&state, &project_id).await?;

    tracing::info!(%project_id, "Project updated");

    Ok(envelope("Project updated successfully", &detail))
}

/// Deletes one of the caller's projects together with all of its tasks.
///
/// # Endpoint
///
/// `DELETE /api/projects/detail/{id}`
///
/// # Errors
///
/// - `400 Bad Request`: malformed ID
/// - `404 Not Found`: missing, owned by someone else, or already deleted
/// - `500 Internal Server Error`: repository failure
pub async fn delete_project(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    let project_id = parse_project_id(&raw_id)?;
    let project = verify_project_owner(&state, &project_id, &caller).await?;

    if !state.projects().delete_cascade(project.project_id()).await? {
        return Err(ApiErrorResponse::not_found(PROJECT_NOT_FOUND));
    }

    tracing::info!(%project_id, "Project deleted");

    Ok(Json(MessageResponse::new("Project deleted successfully")))
}
