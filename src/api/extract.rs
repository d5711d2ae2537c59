//! Request extractors that report failures in the API error envelope.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::{Json, extract::rejection::JsonRejection};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::error::ApiErrorResponse;
use crate::domain::{ProjectId, TaskId};

/// JSON body extractor whose rejection is an [`ApiErrorResponse`].
///
/// Malformed JSON, a missing content type or a body of the wrong shape all
/// become `400 Bad Request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}

/// Decodes a raw request body as JSON regardless of its content type.
///
/// Handlers that must authorize the request before looking at the body
/// take it as [`Bytes`] and decode it here.
///
/// # Errors
///
/// Returns `400 Bad Request` with code `INVALID_JSON` if the body is not
/// valid JSON of the expected shape.
pub fn decode_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiErrorResponse> {
    let Json(value) = Json::<T>::from_bytes(body)?;
    Ok(value)
}

/// Parses a project ID path segment.
///
/// # Errors
///
/// Returns `400 Bad Request` if the segment is not a UUID.
pub fn parse_project_id(raw: &str) -> Result<ProjectId, ApiErrorResponse> {
    Uuid::parse_str(raw)
        .map(ProjectId::from_uuid)
        .map_err(|_| ApiErrorResponse::bad_request("INVALID_ID", "Invalid project ID format"))
}

/// Parses a task ID path segment.
///
/// # Errors
///
/// Returns `400 Bad Request` if the segment is not a UUID.
pub fn parse_task_id(raw: &str) -> Result<TaskId, ApiErrorResponse> {
    Uuid::parse_str(raw)
        .map(TaskId::from_uuid)
        .map_err(|_| ApiErrorResponse::bad_request("INVALID_ID", "Invalid task ID format"))
}
