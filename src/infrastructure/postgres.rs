//! `PostgreSQL` repository implementations.
//!
//! Uses `sqlx::PgPool` for connection pooling. The schema lives in
//! `migrations/` and is applied at startup by the repository factory.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     name VARCHAR(255) NOT NULL,
//!     email VARCHAR(255) NOT NULL UNIQUE,
//!     password_hash VARCHAR(255) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY,
//!     name VARCHAR(255) NOT NULL,
//!     description TEXT,
//!     created_by_id UUID NOT NULL REFERENCES users (id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY,
//!     project_id UUID NOT NULL REFERENCES projects (id) ON DELETE CASCADE,
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT,
//!     status VARCHAR(16) NOT NULL DEFAULT 'todo',
//!     deadline DATE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    Project, ProjectDetail, ProjectId, ProjectPatch, Task, TaskDetail, TaskId, TaskPatch,
    TaskStatus, User, UserId, UserProfile,
};
use crate::infrastructure::{
    ProjectRepository, RepositoryError, RepositoryFuture, TaskRepository, UserRepository,
};

// =============================================================================
// SQL
// =============================================================================

const PROJECT_DETAIL_SELECT: &str = "SELECT p.id, p.name, p.description, p.created_by_id, \
     p.created_at, u.name AS creator_name, u.email AS creator_email \
     FROM projects p JOIN users u ON u.id = p.created_by_id";

const TASK_DETAIL_SELECT: &str = "SELECT t.id, t.project_id, t.title, t.description, \
     t.status, t.deadline, t.created_at, p.name AS project_name, \
     p.description AS project_description, p.created_by_id, \
     p.created_at AS project_created_at, u.name AS creator_name, u.email AS creator_email \
     FROM tasks t \
     JOIN projects p ON p.id = t.project_id \
     JOIN users u ON u.id = p.created_by_id";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self::new(
            UserId::from_uuid(row.id),
            row.name,
            row.email,
            row.password_hash,
            row.created_at,
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectDetailRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_by_id: Uuid,
    created_at: DateTime<Utc>,
    creator_name: String,
    creator_email: String,
}

impl From<ProjectDetailRow> for ProjectDetail {
    fn from(row: ProjectDetailRow) -> Self {
        let created_by = UserId::from_uuid(row.created_by_id);
        Self {
            project: Project {
                project_id: ProjectId::from_uuid(row.id),
                name: row.name,
                description: row.description,
                created_by,
                created_at: row.created_at,
            },
            creator: UserProfile {
                user_id: created_by,
                name: row.creator_name,
                email: row.creator_email,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TaskDetailRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    deadline: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    project_name: String,
    project_description: Option<String>,
    created_by_id: Uuid,
    project_created_at: DateTime<Utc>,
    creator_name: String,
    creator_email: String,
}

impl TryFrom<TaskDetailRow> for TaskDetail {
    type Error = RepositoryError;

    fn try_from(row: TaskDetailRow) -> Result<Self, Self::Error> {
        let status: TaskStatus = row
            .status
            .parse()
            .map_err(|error| RepositoryError::SerializationError(format!("{error}")))?;
        let project_id = ProjectId::from_uuid(row.project_id);
        let created_by = UserId::from_uuid(row.created_by_id);

        Ok(Self {
            task: Task {
                task_id: TaskId::from_uuid(row.id),
                project_id,
                title: row.title,
                description: row.description,
                status,
                deadline: row.deadline,
                created_at: row.created_at,
            },
            project: ProjectDetail {
                project: Project {
                    project_id,
                    name: row.project_name,
                    description: row.project_description,
                    created_by,
                    created_at: row.project_created_at,
                },
                creator: UserProfile {
                    user_id: created_by,
                    name: row.creator_name,
                    email: row.creator_email,
                },
            },
        })
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

#[allow(clippy::needless_pass_by_value)]
fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database) if database.is_unique_violation())
}

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(database) if database.is_foreign_key_violation())
}

// =============================================================================
// PostgreSQL User Repository
// =============================================================================

/// `PostgreSQL` implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserRepository for PostgresUserRepository {
    fn find_by_id(&self, id: &UserId) -> RepositoryFuture<Option<User>> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        Box::pin(async move {
            let row: Option<UserRow> = sqlx::query_as(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;
            Ok(row.map(User::from))
        })
    }

    fn find_by_email(&self, email: &str) -> RepositoryFuture<Option<User>> {
        let pool = self.pool.clone();
        let email = email.to_string();
        Box::pin(async move {
            let row: Option<UserRow> = sqlx::query_as(
                "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;
            Ok(row.map(User::from))
        })
    }

    fn insert(&self, user: &User) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let user = user.clone();
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO users (id, name, email, password_hash, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(user.user_id.as_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&pool)
            .await
            .map_err(|error| {
                if is_unique_violation(&error) {
                    RepositoryError::Conflict(format!(
                        "email {} is already registered",
                        user.email
                    ))
                } else {
                    database_error(error)
                }
            })?;
            Ok(())
        })
    }
}

// =============================================================================
// PostgreSQL Project Repository
// =============================================================================

/// `PostgreSQL` implementation of `ProjectRepository`.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProjectRepository for PostgresProjectRepository {
    fn insert(&self, project: &Project) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let project = project.clone();
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO projects (id, name, description, created_by_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(project.project_id.as_uuid())
            .bind(&project.name)
            .bind(project.description.as_deref())
            .bind(project.created_by.as_uuid())
            .bind(project.created_at)
            .execute(&pool)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    RepositoryError::NotFound(format!("user {}", project.created_by))
                } else {
                    database_error(error)
                }
            })?;
            Ok(())
        })
    }

    fn find_detail(&self, id: &ProjectId) -> RepositoryFuture<Option<ProjectDetail>> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        Box::pin(async move {
            let row: Option<ProjectDetailRow> =
                sqlx::query_as(&format!("{PROJECT_DETAIL_SELECT} WHERE p.id = $1"))
                    .bind(id)
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;
            Ok(row.map(ProjectDetail::from))
        })
    }

    fn find_owned(
        &self,
        id: &ProjectId,
        owner: &UserId,
    ) -> RepositoryFuture<Option<ProjectDetail>> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        let owner = *owner.as_uuid();
        Box::pin(async move {
            let row: Option<ProjectDetailRow> = sqlx::query_as(&format!(
                "{PROJECT_DETAIL_SELECT} WHERE p.id = $1 AND p.created_by_id = $2"
            ))
            .bind(id)
            .bind(owner)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;
            Ok(row.map(ProjectDetail::from))
        })
    }

    fn list_by_owner(&self, owner: &UserId) -> RepositoryFuture<Vec<ProjectDetail>> {
        let pool = self.pool.clone();
        let owner = *owner.as_uuid();
        Box::pin(async move {
            let rows: Vec<ProjectDetailRow> = sqlx::query_as(&format!(
                "{PROJECT_DETAIL_SELECT} WHERE p.created_by_id = $1 ORDER BY p.created_at, p.id"
            ))
            .bind(owner)
            .fetch_all(&pool)
            .await
            .map_err(database_error)?;
            Ok(rows.into_iter().map(ProjectDetail::from).collect())
        })
    }

    fn update(&self, id: &ProjectId, patch: &ProjectPatch) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        let patch = patch.clone();
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE projects SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description) \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(patch.name.as_deref())
            .bind(patch.description.as_deref())
            .execute(&pool)
            .await
            .map_err(database_error)?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete_cascade(&self, id: &ProjectId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let deleted_tasks = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
                .bind(id)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            let deleted_projects = sqlx::query("DELETE FROM projects WHERE id = $1")
                .bind(id)
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            if deleted_projects.rows_affected() == 0 {
                transaction.rollback().await.map_err(database_error)?;
                return Ok(false);
            }

            transaction.commit().await.map_err(database_error)?;

            tracing::debug!(
                project_id = %id,
                deleted_tasks = deleted_tasks.rows_affected(),
                "Deleted project with its tasks"
            );
            Ok(true)
        })
    }
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TaskRepository for PostgresTaskRepository {
    fn insert(&self, task: &Task) -> RepositoryFuture<()> {
        let pool = self.pool.clone();
        let task = task.clone();
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO tasks \
                 (id, project_id, title, description, status, deadline, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(task.task_id.as_uuid())
            .bind(task.project_id.as_uuid())
            .bind(&task.title)
            .bind(task.description.as_deref())
            .bind(task.status.as_str())
            .bind(task.deadline)
            .bind(task.created_at)
            .execute(&pool)
            .await
            .map_err(|error| {
                if is_foreign_key_violation(&error) {
                    RepositoryError::NotFound(format!("project {}", task.project_id))
                } else {
                    database_error(error)
                }
            })?;
            Ok(())
        })
    }

    fn find_in_project(
        &self,
        id: &TaskId,
        project_id: &ProjectId,
    ) -> RepositoryFuture<Option<TaskDetail>> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        let project_id = *project_id.as_uuid();
        Box::pin(async move {
            let row: Option<TaskDetailRow> = sqlx::query_as(&format!(
                "{TASK_DETAIL_SELECT} WHERE t.id = $1 AND t.project_id = $2"
            ))
            .bind(id)
            .bind(project_id)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;
            row.map(TaskDetail::try_from).transpose()
        })
    }

    fn list_by_project(&self, project_id: &ProjectId) -> RepositoryFuture<Vec<TaskDetail>> {
        let pool = self.pool.clone();
        let project_id = *project_id.as_uuid();
        Box::pin(async move {
            let rows: Vec<TaskDetailRow> = sqlx::query_as(&format!(
                "{TASK_DETAIL_SELECT} WHERE t.project_id = $1 ORDER BY t.created_at, t.id"
            ))
            .bind(project_id)
            .fetch_all(&pool)
            .await
            .map_err(database_error)?;
            rows.into_iter().map(TaskDetail::try_from).collect()
        })
    }

    fn update(
        &self,
        id: &TaskId,
        project_id: &ProjectId,
        patch: &TaskPatch,
    ) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        let project_id = *project_id.as_uuid();
        let patch = patch.clone();
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE tasks SET title = $3, description = COALESCE($4, description), \
                 status = $5, deadline = COALESCE($6, deadline) \
                 WHERE id = $1 AND project_id = $2",
            )
            .bind(id)
            .bind(project_id)
            .bind(&patch.title)
            .bind(patch.description.as_deref())
            .bind(patch.status.as_str())
            .bind(patch.deadline)
            .execute(&pool)
            .await
            .map_err(database_error)?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete(&self, id: &TaskId, project_id: &ProjectId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        let project_id = *project_id.as_uuid();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND project_id = $2")
                .bind(id)
                .bind(project_id)
                .execute(&pool)
                .await
                .map_err(database_error)?;
            Ok(result.rows_affected() > 0)
        })
    }
}
