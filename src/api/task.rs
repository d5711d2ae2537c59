//! Task handlers.
//!
//! Tasks are nested under projects. Each handler first proves the caller
//! owns the project in the path, then scopes the task lookup by that
//! project, so a valid task ID paired with another project is a 404.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use super::dto::{MessageResponse, TaskEnvelope, TaskListEnvelope, TaskRequest, TaskResponse};
use super::error::ApiErrorResponse;
use super::extract::{decode_json, parse_project_id, parse_task_id};
use super::guard::{OwnedProject, TASK_NOT_FOUND, find_owned_task, verify_parent_project};
use super::handlers::AppState;
use super::identity::AuthenticatedUser;
use crate::domain::{Task, TaskDetail, TaskId};

fn envelope(message: &str, detail: &TaskDetail) -> Json<TaskEnvelope> {
    Json(TaskEnvelope {
        message: message.to_string(),
        task: TaskResponse::from(detail),
    })
}

/// Reloads a task that was just written.
async fn reload_task(
    state: &AppState,
    task_id: &TaskId,
    project: &OwnedProject,
) -> Result<TaskDetail, ApiErrorResponse> {
    state
        .tasks()
        .find_in_project(task_id, project.project_id())
        .await?
        .ok_or_else(|| {
            tracing::error!(%task_id, "Task missing right after write");
            ApiErrorResponse::internal_error()
        })
}

/// Creates a task in one of the caller's projects.
///
/// # Endpoint
///
/// `POST /api/projects/{project_id}/tasks`
///
/// # Errors
///
/// The body is only decoded once the project is known to be the caller's.
///
/// - `400 Bad Request`: malformed ID, body, status or deadline; nothing is stored
/// - `404 Not Found`: project missing or owned by someone else
/// - `500 Internal Server Error`: repository failure
pub async fn create_task(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(raw_project_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<TaskEnvelope>), ApiErrorResponse> {
    let project_id = parse_project_id(&raw_project_id)?;
    let project = verify_parent_project(&state, &project_id, &caller).await?;
    let fields = decode_json::<TaskRequest>(&body)?.validate()?;

    let task = Task::new(
        TaskId::generate_v7(),
        *project.project_id(),
        fields.title.clone(),
        Utc::now(),
    )
    .apply(&fields);

    state.tasks().insert(&task).await?;
    let detail = reload_task(&state, &task.task_id, &project).await?;

    tracing::info!(task_id = %task.task_id, %project_id, "Task created");

    Ok((StatusCode::CREATED, envelope("Task created successfully", &detail)))
}

/// Lists the tasks of one of the caller's projects, oldest first.
///
/// # Endpoint
///
/// `GET /api/projects/{project_id}/tasks`
///
/// # Errors
///
/// - `400 Bad Request`: malformed ID
/// - `404 Not Found`: project missing or owned by someone else
/// - `500 Internal Server Error`: repository failure
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(raw_project_id): Path<String>,
) -> Result<Json<TaskListEnvelope>, ApiErrorResponse> {
    let project_id = parse_project_id(&raw_project_id)?;
    let project = verify_parent_project(&state, &project_id, &caller).await?;

    let tasks = state.tasks().list_by_project(project.project_id()).await?;

    Ok(Json(TaskListEnvelope {
        message: "Tasks retrieved successfully".to_string(),
        tasks: tasks.iter().map(TaskResponse::from).collect(),
    }))
}

/// Returns a task of one of the caller's projects.
///
/// # Endpoint
///
/// `GET /api/projects/{project_id}/tasks/{task_id}`
///
/// # Errors
///
/// - `400 Bad Request`: malformed ID
/// - `404 Not Found`: project not owned, or task not in that project
/// - `500 Internal Server Error`: repository failure
pub async fn get_task(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((raw_project_id, raw_task_id)): Path<(String, String)>,
) -> Result<Json<TaskEnvelope>, ApiErrorResponse> {
    let project_id = parse_project_id(&raw_project_id)?;
    let task_id = parse_task_id(&raw_task_id)?;
    let project = verify_parent_project(&state, &project_id, &caller).await?;
    let detail = find_owned_task(&state, &task_id, &project).await?;

    Ok(envelope("Task retrieved successfully", &detail))
}

/// Updates a task.
///
/// # Endpoint
///
/// `PUT /api/projects/{project_id}/tasks/{task_id}`
///
/// The body has the same shape as for create. Title and status are
/// replaced; description and deadline only when supplied. The task's ID
/// and project never change.
///
/// # Errors
///
/// - `400 Bad Request`: malformed ID, body, status or deadline
/// - `404 Not Found`: project not owned, or task not in that project
/// - `500 Internal Server Error`: repository failure
pub async fn update_task(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((raw_project_id, raw_task_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<TaskEnvelope>, ApiErrorResponse> {
    let project_id = parse_project_id(&raw_project_id)?;
    let task_id = parse_task_id(&raw_task_id)?;
    let project = verify_parent_project(&state, &project_id, &caller).await?;
    let patch = decode_json::<TaskRequest>(&body)?.validate()?;
    let existing = find_owned_task(&state, &task_id, &project).await?;

    if !state
        .tasks()
        .update(&existing.task.task_id, project.project_id(), &patch)
        .await?
    {
        return Err(ApiErrorResponse::not_found(TASK_NOT_FOUND));
    }
    let detail = reload_task(&state, &task_id, &project).await?;

    tracing::info!(%task_id, %project_id, status = %detail.task.status, "Task updated");

    Ok(envelope("Task updated successfully", &detail))
}

/// Deletes a task of one of the caller's projects.
///
/// # Endpoint
///
/// `DELETE /api/projects/{project_id}/tasks/{task_id}`
///
/// # Errors
///
/// - `400 Bad Request`: malformed ID
/// - `404 Not Found`: project not owned, task not in that project, or already deleted
/// - `500 Internal Server Error`: repository failure
pub async fn delete_task(
    State(state): State<AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path((raw_project_id, raw_task_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiErrorResponse> {
    let project_id = parse_project_id(&raw_project_id)?;
    let task_id = parse_task_id(&raw_task_id)?;
    let project = verify_parent_project(&state, &project_id, &caller).await?;
    let existing = find_owned_task(&state, &task_id, &project).await?;

    if !state
        .tasks()
        .delete(&existing.task.task_id, project.project_id())
        .await?
    {
        return Err(ApiErrorResponse::not_found(TASK_NOT_FOUND));
    }

    tracing::info!(%task_id, %project_id, "Task deleted");

    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
