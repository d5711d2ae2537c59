//! Domain module for task management.
//!
//! This module contains the entities (users, projects, tasks), their
//! identifiers and the joined read models returned by repositories.

pub mod project;
pub mod task;
pub mod user;

pub use project::{Project, ProjectDetail, ProjectId, ProjectPatch};
pub use task::{
    DEADLINE_FORMAT, InvalidDeadline, InvalidTaskStatus, Task, TaskDetail, TaskId, TaskPatch,
    TaskStatus, parse_deadline,
};
pub use user::{User, UserId, UserProfile};
