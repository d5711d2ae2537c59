//! Application state and the health endpoint.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::infrastructure::{
    AuthConfig, PasswordHasher, ProjectRepository, Repositories, TaskRepository, TokenService,
    UserRepository,
};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Repositories are trait objects so the backend can be chosen at startup
/// by `RepositoryFactory`.
#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub tokens: Arc<TokenService>,
    pub passwords: PasswordHasher,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("repositories", &self.repositories)
            .field("tokens", &self.tokens)
            .field("passwords", &self.passwords)
            .finish()
    }
}

impl AppState {
    #[must_use]
    pub fn new(repositories: Repositories, auth: &AuthConfig) -> Self {
        Self {
            repositories,
            tokens: Arc::new(TokenService::new(&auth.jwt_secret, auth.token_ttl)),
            passwords: PasswordHasher::new(auth.bcrypt_cost),
        }
    }

    #[must_use]
    pub fn users(&self) -> &(dyn UserRepository + Send + Sync) {
        self.repositories.user_repository.as_ref()
    }

    #[must_use]
    pub fn projects(&self) -> &(dyn ProjectRepository + Send + Sync) {
        self.repositories.project_repository.as_ref()
    }

    #[must_use]
    pub fn tasks(&self) -> &(dyn TaskRepository + Send + Sync) {
        self.repositories.task_repository.as_ref()
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// State of one backing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyHealth {
    /// `in_memory`, `postgres`, `none` or `redis`.
    pub mode: String,
    /// `up`, `down` or `disabled`.
    pub status: String,
}

impl DependencyHealth {
    fn new(mode: &str, status: &str) -> Self {
        Self {
            mode: mode.to_string(),
            status: status.to_string(),
        }
    }

    fn is_down(&self) -> bool {
        self.status == "down"
    }
}

/// Health check response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    pub version: String,
    pub storage: DependencyHealth,
    pub cache: DependencyHealth,
}

/// Health check endpoint.
///
/// Pings the storage backend and, when configured, Redis.
///
/// # Response
///
/// - **200 OK**: every configured dependency answered
/// - **503 Service Unavailable**: at least one dependency is down
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "storage": { "mode": "postgres", "status": "up" },
///   "cache": { "mode": "none", "status": "disabled" }
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let repositories = &state.repositories;
    let storage_mode = repositories.storage.mode().as_str();

    let storage = match repositories.storage.ping().await {
        Ok(()) => DependencyHealth::new(storage_mode, "up"),
        Err(error) => {
            tracing::warn!(%error, "Storage health check failed");
            DependencyHealth::new(storage_mode, "down")
        }
    };

    let cache = match &repositories.cache {
        None => DependencyHealth::new("none", "disabled"),
        Some(cache) => match cache.ping().await {
            Ok(()) => DependencyHealth::new("redis", "up"),
            Err(error) => {
                tracing::warn!(%error, "Cache health check failed");
                DependencyHealth::new("redis", "down")
            }
        },
    };

    let degraded = storage.is_down() || cache.is_down();
    let (status_code, status) = if degraded {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    } else {
        (StatusCode::OK, "healthy")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage,
            cache,
        }),
    )
}
