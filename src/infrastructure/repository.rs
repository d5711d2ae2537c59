//! Repository traits for domain entities.
//!
//! Every method returns a boxed `'static` future so the traits stay
//! dyn-compatible and can be shared as `Arc<dyn ...>` in the application
//! state. Joined reads (`ProjectDetail`, `TaskDetail`) never load password
//! hashes.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{
    Project, ProjectDetail, ProjectId, ProjectPatch, Task, TaskDetail, TaskId, TaskPatch, User,
    UserId,
};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A referenced entity was not found.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored value could not be decoded into the domain model.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Future returned by every repository method.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

// =============================================================================
// User Repository
// =============================================================================

/// Repository trait for users.
pub trait UserRepository: Send + Sync {
    /// Finds a user by ID.
    fn find_by_id(&self, id: &UserId) -> RepositoryFuture<Option<User>>;

    /// Finds a user by (lowercased) email.
    fn find_by_email(&self, email: &str) -> RepositoryFuture<Option<User>>;

    /// Inserts a new user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    fn insert(&self, user: &User) -> RepositoryFuture<()>;
}

// =============================================================================
// Project Repository
// =============================================================================

/// Repository trait for projects.
pub trait ProjectRepository: Send + Sync {
    /// Inserts a new project. Its creator must exist.
    fn insert(&self, project: &Project) -> RepositoryFuture<()>;

    /// Finds a project by ID, joined with its creator, regardless of owner.
    fn find_detail(&self, id: &ProjectId) -> RepositoryFuture<Option<ProjectDetail>>;

    /// Finds a project by ID only if `owner` created it.
    ///
    /// A project owned by someone else is reported exactly like a missing one.
    fn find_owned(
        &self,
        id: &ProjectId,
        owner: &UserId,
    ) -> RepositoryFuture<Option<ProjectDetail>>;

    /// Lists every project created by `owner`, oldest first.
    fn list_by_owner(&self, owner: &UserId) -> RepositoryFuture<Vec<ProjectDetail>>;

    /// Applies a patch. Returns `false` if the project does not exist.
    fn update(&self, id: &ProjectId, patch: &ProjectPatch) -> RepositoryFuture<bool>;

    /// Deletes a project and all of its tasks atomically.
    ///
    /// Returns `false` if the project did not exist; nothing is deleted then.
    fn delete_cascade(&self, id: &ProjectId) -> RepositoryFuture<bool>;
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for tasks.
///
/// Every lookup is scoped by project ID: a task ID paired with the wrong
/// project is treated as not found.
pub trait TaskRepository: Send + Sync {
    /// Inserts a new task. Its project must exist.
    fn insert(&self, task: &Task) -> RepositoryFuture<()>;

    /// Finds a task by `(id, project_id)`, joined with project and creator.
    fn find_in_project(
        &self,
        id: &TaskId,
        project_id: &ProjectId,
    ) -> RepositoryFuture<Option<TaskDetail>>;

    /// Lists all tasks of a project, oldest first.
    fn list_by_project(&self, project_id: &ProjectId) -> RepositoryFuture<Vec<TaskDetail>>;

    /// Applies a patch to the task at `(id, project_id)`.
    ///
    /// Returns `false` if no such task exists.
    fn update(
        &self,
        id: &TaskId,
        project_id: &ProjectId,
        patch: &TaskPatch,
    ) -> RepositoryFuture<bool>;

    /// Deletes the task at `(id, project_id)`. Returns `false` if absent.
    fn delete(&self, id: &TaskId, project_id: &ProjectId) -> RepositoryFuture<bool>;
}
