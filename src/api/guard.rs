//! Ownership-scoped lookups.
//!
//! Every project or task access goes through [`scoped_lookup`]. A resource
//! that does not exist and one that belongs to somebody else produce the same
//! 404; repository failures are 500s.
//!
//! Tasks are looked up with an [`OwnedProject`] as their scope. That value
//! can only be produced by a successful ownership check, so a task lookup
//! without one does not compile.

use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::domain::{ProjectDetail, ProjectId, TaskDetail, TaskId, UserId};
use crate::infrastructure::RepositoryFuture;

pub(super) const PROJECT_NOT_FOUND: &str = "Project not found or you don't have access";
const PARENT_PROJECT_NOT_FOUND: &str =
    "Project not found or you don't have access to this project";
pub(super) const TASK_NOT_FOUND: &str = "Task not found in this project or you don't have access";

/// A resource reachable only within a scope.
pub trait ScopedResource: Sized + Send + 'static {
    type Id: Sync;
    type Scope: Sync;

    /// Message of the 404 returned when the lookup finds nothing.
    const NOT_FOUND: &'static str;

    fn find(state: &AppState, id: &Self::Id, scope: &Self::Scope)
    -> RepositoryFuture<Option<Self>>;
}

/// Runs a scoped lookup, turning "absent" into a 404.
///
/// # Errors
///
/// Returns `404 Not Found` if the resource is missing or out of scope and
/// `500 Internal Server Error` if the repository fails.
pub async fn scoped_lookup<R: ScopedResource>(
    state: &AppState,
    id: &R::Id,
    scope: &R::Scope,
) -> Result<R, ApiErrorResponse> {
    R::find(state, id, scope)
        .await?
        .ok_or_else(|| ApiErrorResponse::not_found(R::NOT_FOUND))
}

// =============================================================================
// Projects
// =============================================================================

/// A project the caller has been verified to own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedProject {
    detail: ProjectDetail,
}

impl OwnedProject {
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.detail.project.project_id
    }

    #[must_use]
    pub const fn detail(&self) -> &ProjectDetail {
        &self.detail
    }

    fn find_owned(
        state: &AppState,
        id: &ProjectId,
        owner: &UserId,
    ) -> RepositoryFuture<Option<Self>> {
        let lookup = state.projects().find_owned(id, owner);
        Box::pin(async move { Ok(lookup.await?.map(|detail| Self { detail })) })
    }
}

impl ScopedResource for OwnedProject {
    type Id = ProjectId;
    type Scope = UserId;

    const NOT_FOUND: &'static str = PROJECT_NOT_FOUND;

    fn find(state: &AppState, id: &ProjectId, owner: &UserId) -> RepositoryFuture<Option<Self>> {
        Self::find_owned(state, id, owner)
    }
}

/// The project named in a task route, verified to be owned by the caller.
///
/// Identical to [`OwnedProject`] apart from its 404 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentProject(pub OwnedProject);

impl ScopedResource for ParentProject {
    type Id = ProjectId;
    type Scope = UserId;

    const NOT_FOUND: &'static str = PARENT_PROJECT_NOT_FOUND;

    fn find(state: &AppState, id: &ProjectId, owner: &UserId) -> RepositoryFuture<Option<Self>> {
        let lookup = OwnedProject::find_owned(state, id, owner);
        Box::pin(async move { Ok(lookup.await?.map(Self)) })
    }
}

// =============================================================================
// Tasks
// =============================================================================

impl ScopedResource for TaskDetail {
    type Id = TaskId;
    type Scope = OwnedProject;

    const NOT_FOUND: &'static str = TASK_NOT_FOUND;

    fn find(
        state: &AppState,
        id: &TaskId,
        project: &OwnedProject,
    ) -> RepositoryFuture<Option<Self>> {
        state.tasks().find_in_project(id, project.project_id())
    }
}

/// Verifies that `owner` created the project.
///
/// # Errors
///
/// See [`scoped_lookup`].
pub async fn verify_project_owner(
    state: &AppState,
    project_id: &ProjectId,
    owner: &UserId,
) -> Result<OwnedProject, ApiErrorResponse> {
    scoped_lookup::<OwnedProject>(state, project_id, owner).await
}

/// Verifies ownership of the parent project for a task route.
///
/// # Errors
///
/// See [`scoped_lookup`].
pub async fn verify_parent_project(
    state: &AppState,
    project_id: &ProjectId,
    owner: &UserId,
) -> Result<OwnedProject, ApiErrorResponse> {
    scoped_lookup::<ParentProject>(state, project_id, owner)
        .await
        .map(|ParentProject(project)| project)
}

/// Finds a task inside a project already verified to be owned by the caller.
///
/// # Errors
///
/// See [`scoped_lookup`].
pub async fn find_owned_task(
    state: &AppState,
    task_id: &TaskId,
    project: &OwnedProject,
) -> Result<TaskDetail, ApiErrorResponse> {
    scoped_lookup::<TaskDetail>(state, task_id, project).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Project, Task, User};
    use crate::infrastructure::{AuthConfig, Repositories};
    use axum::http::StatusCode;
    use chrono::Utc;
    use rstest::rstest;

    async fn seeded_state() -> (AppState, UserId, UserId, ProjectId, TaskId) {
        let state = AppState::new(
            Repositories::in_memory(),
            &AuthConfig::new("guard-secret").with_bcrypt_cost(4),
        );
        let owner = User::new(
            UserId::generate_v7(),
            "Owner",
            "owner@example.com",
            "hash",
            Utc::now(),
        );
        let stranger = User::new(
            UserId::generate_v7(),
            "Stranger",
            "stranger@example.com",
            "hash",
            Utc::now(),
        );
        state.users().insert(&owner).await.unwrap();
        state.users().insert(&stranger).await.unwrap();

        let project = Project::new(ProjectId::generate_v7(), "Roadmap", owner.user_id, Utc::now());
        state.projects().insert(&project).await.unwrap();
        let task = Task::new(TaskId::generate_v7(), project.project_id, "Plan", Utc::now());
        state.tasks().insert(&task).await.unwrap();

        (
            state,
            owner.user_id,
            stranger.user_id,
            project.project_id,
            task.task_id,
        )
    }

    #[rstest]
    #[tokio::test]
    async fn test_owner_passes_guard() {
        let (state, owner, _, project_id, task_id) = seeded_state().await;

        let project = verify_project_owner(&state, &project_id, &owner)
            .await
            .unwrap();
        let task = find_owned_task(&state, &task_id, &project).await.unwrap();

        assert_eq!(project.project_id(), &project_id);
        assert_eq!(task.task.task_id, task_id);
    }

    #[rstest]
    #[tokio::test]
    async fn test_foreign_and_missing_projects_look_the_same() {
        let (state, _, stranger, project_id, _) = seeded_state().await;

        let foreign = verify_project_owner(&state, &project_id, &stranger)
            .await
            .unwrap_err();
        let missing = verify_project_owner(&state, &ProjectId::generate_v7(), &stranger)
            .await
            .unwrap_err();

        assert_eq!(foreign.status, StatusCode::NOT_FOUND);
        assert_eq!(foreign.error, missing.error);
        assert_eq!(foreign.error.error, PROJECT_NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_parent_project_uses_task_route_message() {
        let (state, _, stranger, project_id, _) = seeded_state().await;

        let rejection = verify_parent_project(&state, &project_id, &stranger)
            .await
            .unwrap_err();

        assert_eq!(rejection.error.error, PARENT_PROJECT_NOT_FOUND);
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_from_other_project_is_not_found() {
        let (state, owner, _, project_id, task_id) = seeded_state().await;
        let other = Project::new(ProjectId::generate_v7(), "Other", owner, Utc::now());
        state.projects().insert(&other).await.unwrap();
        let other = verify_project_owner(&state, &other.project_id, &owner)
            .await
            .unwrap();

        let rejection = find_owned_task(&state, &task_id, &other).await.unwrap_err();

        assert_eq!(rejection.status, StatusCode::NOT_FOUND);
        assert_eq!(rejection.error.error, TASK_NOT_FOUND);
        assert!(verify_project_owner(&state, &project_id, &owner).await.is_ok());
    }
}
