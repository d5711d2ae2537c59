//! In-memory repository implementations.
//!
//! All three repositories share one set of tables behind a single
//! `tokio::sync::RwLock`, so multi-table operations such as the project
//! cascade delete happen under one write guard and are atomic.
//!
//! Suitable for development and tests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{
    Project, ProjectDetail, ProjectId, ProjectPatch, Task, TaskDetail, TaskId, TaskPatch, User,
    UserId,
};
use crate::infrastructure::{
    ProjectRepository, RepositoryError, RepositoryFuture, TaskRepository, UserRepository,
};

// =============================================================================
// Tables
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
}

impl Tables {
    fn project_detail(&self, project: &Project) -> Result<ProjectDetail, RepositoryError> {
        let creator = self.users.get(&project.created_by).ok_or_else(|| {
            RepositoryError::DatabaseError(format!(
                "project {} references missing user {}",
                project.project_id, project.created_by
            ))
        })?;

        Ok(ProjectDetail {
            project: project.clone(),
            creator: creator.profile(),
        })
    }

    fn task_detail(&self, task: &Task) -> Result<TaskDetail, RepositoryError> {
        let project = self.projects.get(&task.project_id).ok_or_else(|| {
            RepositoryError::DatabaseError(format!(
                "task {} references missing project {}",
                task.task_id, task.project_id
            ))
        })?;

        Ok(TaskDetail {
            task: task.clone(),
            project: self.project_detail(project)?,
        })
    }
}

type SharedTables = Arc<RwLock<Tables>>;

// =============================================================================
// In-Memory Database
// =============================================================================

/// Shared in-memory storage from which the repositories are created.
///
/// # Example
///
/// ```
/// use taskify::infrastructure::InMemoryDatabase;
///
/// let database = InMemoryDatabase::new();
/// let users = database.user_repository();
/// let projects = database.project_repository();
/// let tasks = database.task_repository();
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: SharedTables,
}

impl InMemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user_repository(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    #[must_use]
    pub fn project_repository(&self) -> InMemoryProjectRepository {
        InMemoryProjectRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    #[must_use]
    pub fn task_repository(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository {
            tables: Arc::clone(&self.tables),
        }
    }
}

// =============================================================================
// In-Memory User Repository
// =============================================================================

/// In-memory implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    tables: SharedTables,
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: &UserId) -> RepositoryFuture<Option<User>> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        Box::pin(async move { Ok(tables.read().await.users.get(&id).cloned()) })
    }

    fn find_by_email(&self, email: &str) -> RepositoryFuture<Option<User>> {
        let tables = Arc::clone(&self.tables);
        let email = email.to_string();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard.users.values().find(|user| user.email == email).cloned())
        })
    }

    fn insert(&self, user: &User) -> RepositoryFuture<()> {
        let tables = Arc::clone(&self.tables);
        let user = user.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            if guard.users.values().any(|existing| existing.email == user.email) {
                return Err(RepositoryError::Conflict(format!(
                    "email {} is already registered",
                    user.email
                )));
            }
            guard.users.insert(user.user_id, user);
            Ok(())
        })
    }
}

// =============================================================================
// In-Memory Project Repository
// =============================================================================

/// In-memory implementation of `ProjectRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryProjectRepository {
    tables: SharedTables,
}

impl ProjectRepository for InMemoryProjectRepository {
    fn insert(&self, project: &Project) -> RepositoryFuture<()> {
        let tables = Arc::clone(&self.tables);
        let project = project.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            if !guard.users.contains_key(&project.created_by) {
                return Err(RepositoryError::NotFound(format!(
                    "user {}",
                    project.created_by
                )));
            }
            guard.projects.insert(project.project_id, project);
            Ok(())
        })
    }

    fn find_detail(&self, id: &ProjectId) -> RepositoryFuture<Option<ProjectDetail>> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        Box::pin(async move {
            let guard = tables.read().await;
            guard
                .projects
                .get(&id)
                .map(|project| guard.project_detail(project))
                .transpose()
        })
    }

    fn find_owned(
        &self,
        id: &ProjectId,
        owner: &UserId,
    ) -> RepositoryFuture<Option<ProjectDetail>> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        let owner = *owner;
        Box::pin(async move {
            let guard = tables.read().await;
            guard
                .projects
                .get(&id)
                .filter(|project| project.is_owned_by(&owner))
                .map(|project| guard.project_detail(project))
                .transpose()
        })
    }

    fn list_by_owner(&self, owner: &UserId) -> RepositoryFuture<Vec<ProjectDetail>> {
        let tables = Arc::clone(&self.tables);
        let owner = *owner;
        Box::pin(async move {
            let guard = tables.read().await;
            let mut projects: Vec<&Project> = guard
                .projects
                .values()
                .filter(|project| project.is_owned_by(&owner))
                .collect();
            projects.sort_by_key(|project| (project.created_at, project.project_id));
            projects
                .into_iter()
                .map(|project| guard.project_detail(project))
                .collect()
        })
    }

    fn update(&self, id: &ProjectId, patch: &ProjectPatch) -> RepositoryFuture<bool> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        let patch = patch.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            let Some(project) = guard.projects.remove(&id) else {
                return Ok(false);
            };
            guard.projects.insert(id, project.apply(&patch));
            Ok(true)
        })
    }

    fn delete_cascade(&self, id: &ProjectId) -> RepositoryFuture<bool> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        Box::pin(async move {
            let mut guard = tables.write().await;
            if guard.projects.remove(&id).is_none() {
                return Ok(false);
            }
            guard.tasks.retain(|_, task| task.project_id != id);
            Ok(true)
        })
    }
}

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    tables: SharedTables,
}

impl TaskRepository for InMemoryTaskRepository {
    fn insert(&self, task: &Task) -> RepositoryFuture<()> {
        let tables = Arc::clone(&self.tables);
        let task = task.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            if !guard.projects.contains_key(&task.project_id) {
                return Err(RepositoryError::NotFound(format!(
                    "project {}",
                    task.project_id
                )));
            }
            guard.tasks.insert(task.task_id, task);
            Ok(())
        })
    }

    fn find_in_project(
        &self,
        id: &TaskId,
        project_id: &ProjectId,
    ) -> RepositoryFuture<Option<TaskDetail>> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        let project_id = *project_id;
        Box::pin(async move {
            let guard = tables.read().await;
            guard
                .tasks
                .get(&id)
                .filter(|task| task.project_id == project_id)
                .map(|task| guard.task_detail(task))
                .transpose()
        })
    }

    fn list_by_project(&self, project_id: &ProjectId) -> RepositoryFuture<Vec<TaskDetail>> {
        let tables = Arc::clone(&self.tables);
        let project_id = *project_id;
        Box::pin(async move {
            let guard = tables.read().await;
            let mut tasks: Vec<&Task> = guard
                .tasks
                .values()
                .filter(|task| task.project_id == project_id)
                .collect();
            tasks.sort_by_key(|task| (task.created_at, task.task_id));
            tasks
                .into_iter()
                .map(|task| guard.task_detail(task))
                .collect()
        })
    }

    fn update(
        &self,
        id: &TaskId,
        project_id: &ProjectId,
        patch: &TaskPatch,
    ) -> RepositoryFuture<bool> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        let project_id = *project_id;
        let patch = patch.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            match guard.tasks.get(&id) {
                Some(task) if task.project_id == project_id => {
                    let updated = task.clone().apply(&patch);
                    guard.tasks.insert(id, updated);
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    fn delete(&self, id: &TaskId, project_id: &ProjectId) -> RepositoryFuture<bool> {
        let tables = Arc::clone(&self.tables);
        let id = *id;
        let project_id = *project_id;
        Box::pin(async move {
            let mut guard = tables.write().await;
            let matches = guard
                .tasks
                .get(&id)
                .is_some_and(|task| task.project_id == project_id);
            if matches {
                guard.tasks.remove(&id);
            }
            Ok(matches)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskStatus;
    use chrono::Utc;
    use rstest::rstest;

    struct Fixture {
        users: InMemoryUserRepository,
        projects: InMemoryProjectRepository,
        tasks: InMemoryTaskRepository,
    }

    fn fixture() -> Fixture {
        let database = InMemoryDatabase::new();
        Fixture {
            users: database.user_repository(),
            projects: database.project_repository(),
            tasks: database.task_repository(),
        }
    }

    fn test_user(email: &str) -> User {
        User::new(UserId::generate_v7(), "Test User", email, "hash", Utc::now())
    }

    async fn seeded_project(fixture: &Fixture, email: &str) -> (User, Project) {
        let user = test_user(email);
        fixture.users.insert(&user).await.unwrap();
        let project = Project::new(ProjectId::generate_v7(), "Alpha", user.user_id, Utc::now());
        fixture.projects.insert(&project).await.unwrap();
        (user, project)
    }

    #[rstest]
    #[tokio::test]
    async fn test_user_insert_rejects_duplicate_email() {
        let fixture = fixture();
        fixture.users.insert(&test_user("a@example.com")).await.unwrap();

        let result = fixture.users.insert(&test_user("a@example.com")).await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_user_find_by_email() {
        let fixture = fixture();
        let user = test_user("a@example.com");
        fixture.users.insert(&user).await.unwrap();

        let found = fixture.users.find_by_email("a@example.com").await.unwrap();

        assert_eq!(found.map(|user| user.user_id), Some(user.user_id));
        assert!(
            fixture
                .users
                .find_by_email("b@example.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_project_insert_requires_existing_creator() {
        let fixture = fixture();
        let project = Project::new(
            ProjectId::generate_v7(),
            "Orphan",
            UserId::generate_v7(),
            Utc::now(),
        );

        let result = fixture.projects.insert(&project).await;

        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_owned_hides_other_owners() {
        let fixture = fixture();
        let (owner, project) = seeded_project(&fixture, "owner@example.com").await;
        let stranger = test_user("stranger@example.com");
        fixture.users.insert(&stranger).await.unwrap();

        let as_owner = fixture
            .projects
            .find_owned(&project.project_id, &owner.user_id)
            .await
            .unwrap();
        let as_stranger = fixture
            .projects
            .find_owned(&project.project_id, &stranger.user_id)
            .await
            .unwrap();

        let detail = as_owner.unwrap();
        assert_eq!(detail.creator.email, "owner@example.com");
        assert!(as_stranger.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_by_owner_filters_and_orders() {
        let fixture = fixture();
        let (owner, first) = seeded_project(&fixture, "owner@example.com").await;
        let second = Project::new(
            ProjectId::generate_v7(),
            "Beta",
            owner.user_id,
            first.created_at + chrono::Duration::seconds(1),
        );
        fixture.projects.insert(&second).await.unwrap();
        seeded_project(&fixture, "other@example.com").await;

        let listed = fixture.projects.list_by_owner(&owner.user_id).await.unwrap();

        let names: Vec<&str> = listed
            .iter()
            .map(|detail| detail.project.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_cascade_removes_tasks() {
        let fixture = fixture();
        let (_, project) = seeded_project(&fixture, "owner@example.com").await;
        let task = Task::new(
            TaskId::generate_v7(),
            project.project_id,
            "Write",
            Utc::now(),
        );
        fixture.tasks.insert(&task).await.unwrap();

        assert!(fixture.projects.delete_cascade(&project.project_id).await.unwrap());
        assert!(!fixture.projects.delete_cascade(&project.project_id).await.unwrap());

        let remaining = fixture
            .tasks
            .find_in_project(&task.task_id, &project.project_id)
            .await
            .unwrap();
        assert!(remaining.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_lookup_scoped_by_project() {
        let fixture = fixture();
        let (_, project) = seeded_project(&fixture, "owner@example.com").await;
        let (_, other_project) = seeded_project(&fixture, "other@example.com").await;
        let task = Task::new(
            TaskId::generate_v7(),
            project.project_id,
            "Write",
            Utc::now(),
        );
        fixture.tasks.insert(&task).await.unwrap();

        let wrong_project = fixture
            .tasks
            .find_in_project(&task.task_id, &other_project.project_id)
            .await
            .unwrap();
        let patch = TaskPatch {
            title: "Hijack".to_string(),
            description: None,
            status: TaskStatus::Done,
            deadline: None,
        };

        assert!(wrong_project.is_none());
        assert!(
            !fixture
                .tasks
                .update(&task.task_id, &other_project.project_id, &patch)
                .await
                .unwrap()
        );
        assert!(
            !fixture
                .tasks
                .delete(&task.task_id, &other_project.project_id)
                .await
                .unwrap()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_task_update_applies_patch() {
        let fixture = fixture();
        let (_, project) = seeded_project(&fixture, "owner@example.com").await;
        let task = Task::new(
            TaskId::generate_v7(),
            project.project_id,
            "Write",
            Utc::now(),
        );
        fixture.tasks.insert(&task).await.unwrap();
        let patch = TaskPatch {
            title: "Review".to_string(),
            description: Some("carefully".to_string()),
            status: TaskStatus::InProgress,
            deadline: None,
        };

        let updated = fixture
            .tasks
            .update(&task.task_id, &project.project_id, &patch)
            .await
            .unwrap();
        let detail = fixture
            .tasks
            .find_in_project(&task.task_id, &project.project_id)
            .await
            .unwrap()
            .unwrap();

        assert!(updated);
        assert_eq!(detail.task.task_id, task.task_id);
        assert_eq!(detail.task.title, "Review");
        assert_eq!(detail.task.status, TaskStatus::InProgress);
        assert_eq!(detail.project.project.project_id, project.project_id);
    }
}
