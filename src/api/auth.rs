//! Registration and login handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use super::dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserResponse};
use super::error::ApiErrorResponse;
use super::extract::JsonBody;
use super::handlers::AppState;
use crate::domain::{User, UserId};
use crate::infrastructure::RepositoryError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn email_taken() -> ApiErrorResponse {
    ApiErrorResponse::bad_request("EMAIL_TAKEN", "Email is already registered")
}

/// Registers a new user.
///
/// # Endpoint
///
/// `POST /api/auth/register`
///
/// # Errors
///
/// - `400 Bad Request`: invalid fields or an email that is already registered
/// - `500 Internal Server Error`: hashing or repository failure
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiErrorResponse> {
    let new_user = request.validate()?;

    if state.users().find_by_email(&new_user.email).await?.is_some() {
        return Err(email_taken());
    }

    let password_hash = state.passwords.hash(&new_user.password).await?;
    let user = User::new(
        UserId::generate_v7(),
        new_user.name,
        new_user.email,
        password_hash,
        Utc::now(),
    );

    // A concurrent registration can still win the race for the email.
    match state.users().insert(&user).await {
        Ok(()) => {}
        Err(RepositoryError::Conflict(_)) => return Err(email_taken()),
        Err(error) => return Err(error.into()),
    }

    tracing::info!(user_id = %user.user_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: UserResponse::from(&user.profile()),
        }),
    ))
}

/// Exchanges credentials for an access token.
///
/// # Endpoint
///
/// `POST /api/auth/login`
///
/// # Errors
///
/// - `400 Bad Request`: missing email or password
/// - `401 Unauthorized`: unknown email or wrong password, indistinguishably
/// - `500 Internal Server Error`: hashing, signing or repository failure
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiErrorResponse> {
    let credentials = request.validate()?;

    let Some(user) = state.users().find_by_email(&credentials.email).await? else {
        // Spend the same hashing time as a real check.
        state.passwords.hash(&credentials.password).await?;
        tracing::debug!("Login attempt for unknown email");
        return Err(ApiErrorResponse::unauthorized(INVALID_CREDENTIALS));
    };

    if !state
        .passwords
        .verify(&credentials.password, &user.password_hash)
        .await?
    {
        tracing::debug!(user_id = %user.user_id, "Login attempt with wrong password");
        return Err(ApiErrorResponse::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state.tokens.issue(&user.user_id)?;
    tracing::info!(user_id = %user.user_id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: UserResponse::from(&user.profile()),
    }))
}
