//! Routing definitions.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{login, register};
use super::handlers::{AppState, health_check};
use super::identity::AuthLayer;
use super::project::{create_project, delete_project, get_project, list_projects, update_project};
use super::task::{create_task, delete_task, get_task, list_tasks, update_task};

/// Creates the application router with all routes and middleware.
///
/// `/health` and `/api/auth/*` are public. Everything under
/// `/api/projects` requires a bearer token.
///
/// # Examples
///
/// ```ignore
/// let state = AppState::new(repositories, &settings.auth);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, create_router(state)).await?;
/// ```
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let protected_routes = Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/detail/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route(
            "/projects/{project_id}/tasks",
            get(list_tasks).post(create_task),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route_layer(AuthLayer::new(state.tokens.clone()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
