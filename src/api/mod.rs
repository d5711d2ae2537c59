//! API module for HTTP handlers.
//!
//! This module contains route definitions, request/response handlers and
//! the authentication middleware.

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod project;
pub mod routes;
pub mod task;

pub use auth::{login, register};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use handlers::{AppState, DependencyHealth, HealthResponse, health_check};
pub use identity::{AuthLayer, AuthenticatedUser};
pub use project::{create_project, delete_project, get_project, list_projects, update_project};
pub use routes::create_router;
pub use task::{create_task, delete_task, get_task, list_tasks, update_task};
