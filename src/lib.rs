//! Taskify API Library
//!
//! A task-management backend: users own projects, projects contain tasks,
//! and every project or task access is scoped to the project's creator.
//!
//! - [`domain`]: users, projects, tasks and their joined read models
//! - [`infrastructure`]: repositories, configuration and credential services
//! - [`api`]: the axum router, handlers and authentication middleware

pub mod api;
pub mod domain;
pub mod infrastructure;
