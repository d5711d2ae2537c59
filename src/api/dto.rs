//! Data Transfer Objects for API requests and responses.
//!
//! Request fields are all optional at the serde level so that a missing
//! field is reported next to every other invalid field instead of aborting
//! deserialization. Each request type has a `validate` method that turns it
//! into domain values or a [`ValidationError`] listing every problem.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{FieldError, ValidationError};
use crate::domain::{
    DEADLINE_FORMAT, ProjectDetail, ProjectPatch, TaskDetail, TaskPatch, TaskStatus, UserId,
    UserProfile, parse_deadline,
};

/// Maximum length of names, titles and emails.
const MAX_NAME_LENGTH: usize = 255;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

type Validated<T> = Result<T, FieldError>;

// =============================================================================
// Field Validators
// =============================================================================

fn required_text(field: &str, label: &str, value: Option<&str>) -> Validated<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        Err(FieldError::new(field, format!("{label} is required")))
    } else if trimmed.chars().count() > MAX_NAME_LENGTH {
        Err(FieldError::new(
            field,
            format!("{label} must be at most {MAX_NAME_LENGTH} characters"),
        ))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Empty and whitespace-only descriptions are stored as absent.
fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn required_user_id(field: &str, value: Option<&str>) -> Validated<UserId> {
    let raw = value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| FieldError::new(field, "created_by is required"))?;
    Uuid::parse_str(raw)
        .map(UserId::from_uuid)
        .map_err(|_| FieldError::new(field, "created_by must be a valid UUID"))
}

fn required_status(value: Option<&str>) -> Validated<TaskStatus> {
    let raw = value.ok_or_else(|| FieldError::new("status", "Status is required"))?;
    raw.parse()
        .map_err(|error: crate::domain::InvalidTaskStatus| FieldError::new("status", error.to_string()))
}

fn optional_deadline(value: Option<&str>) -> Validated<Option<chrono::NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_deadline(raw)
            .map(Some)
            .map_err(|error| FieldError::new("deadline", error.to_string())),
    }
}

fn email(value: Option<&str>) -> Validated<String> {
    let normalized = value.map(str::trim).unwrap_or_default().to_lowercase();
    if normalized.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    if normalized.chars().count() > MAX_NAME_LENGTH {
        return Err(FieldError::new(
            "email",
            format!("Email must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }
    let well_formed = normalized
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        && !normalized.chars().any(char::is_whitespace);
    if well_formed {
        Ok(normalized)
    } else {
        Err(FieldError::new("email", "Email must be a valid email address"))
    }
}

fn new_password(value: Option<&str>) -> Validated<String> {
    match value {
        None | Some("") => Err(FieldError::new("password", "Password is required")),
        Some(password) if password.chars().count() < MIN_PASSWORD_LENGTH => Err(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        )),
        Some(password) => Ok(password.to_string()),
    }
}

/// Records a failed field and yields its value otherwise.
fn collect<T>(errors: &mut ValidationError, result: Validated<T>) -> Option<T> {
    result
        .map_err(|error| errors.errors.push(error))
        .ok()
}

// =============================================================================
// Auth DTOs
// =============================================================================

/// Request DTO for `POST /api/auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// A validated registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    /// Trimmed and lowercased.
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let mut errors = ValidationError::default();
        let name = collect(&mut errors, required_text("name", "Name", self.name.as_deref()));
        let email = collect(&mut errors, email(self.email.as_deref()));
        let password = collect(&mut errors, new_password(self.password.as_deref()));

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) => errors.finish(NewUser {
                name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

/// Request DTO for `POST /api/auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Login credentials with a normalized email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Only checks presence; a malformed email simply fails to match.
    ///
    /// # Errors
    ///
    /// Returns every missing field.
    pub fn validate(self) -> Result<Credentials, ValidationError> {
        let mut errors = ValidationError::default();
        let email = self
            .email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty());
        let password = self.password.filter(|password| !password.is_empty());

        if email.is_none() {
            errors.push("email", "Email is required");
        }
        if password.is_none() {
            errors.push("password", "Password is required");
        }

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(errors),
        }
    }
}

/// Public fields of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&UserProfile> for UserResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.user_id.to_string(),
            name: profile.name.clone(),
            email: profile.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

// =============================================================================
// Project DTOs
// =============================================================================

/// Request DTO for creating a project.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Creator named explicitly by the client.
    #[serde(default)]
    pub created_by: Option<String>,
}

/// A validated project creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub created_by: UserId,
}

impl CreateProjectRequest {
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(self) -> Result<NewProject, ValidationError> {
        let mut errors = ValidationError::default();
        let name = collect(&mut errors, required_text("name", "Name", self.name.as_deref()));
        let created_by = collect(
            &mut errors,
            required_user_id("created_by", self.created_by.as_deref()),
        );

        match (name, created_by) {
            (Some(name), Some(created_by)) => errors.finish(NewProject {
                name,
                description: optional_text(self.description.as_deref()),
                created_by,
            }),
            _ => Err(errors),
        }
    }
}

/// Request DTO for updating a project. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// An empty or blank string leaves the description unchanged.
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdateProjectRequest {
    /// # Errors
    ///
    /// Returns an error if a supplied name is blank or too long.
    pub fn validate(self) -> Result<ProjectPatch, ValidationError> {
        let name = match self.name {
            None => None,
            Some(name) => Some(
                required_text("name", "Name", Some(&name))
                    .map_err(|error| ValidationError::new(vec![error]))?,
            ),
        };

        Ok(ProjectPatch {
            name,
            description: optional_text(self.description.as_deref()),
        })
    }
}

/// Response DTO for a project with its creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by_id: String,
    pub created_at: String,
    pub creator: UserResponse,
}

impl From<&ProjectDetail> for ProjectResponse {
    fn from(detail: &ProjectDetail) -> Self {
        let project = &detail.project;
        Self {
            id: project.project_id.to_string(),
            name: project.name.clone(),
            description: project.description.clone(),
            created_by_id: project.created_by.to_string(),
            created_at: project.created_at.to_rfc3339(),
            creator: UserResponse::from(&detail.creator),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEnvelope {
    pub message: String,
    pub project: ProjectResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListEnvelope {
    pub message: String,
    pub projects: Vec<ProjectResponse>,
}

// =============================================================================
// Task DTOs
// =============================================================================

/// Request DTO for creating or updating a task.
///
/// Update uses the same shape. Title and status are always replaced; an
/// omitted or empty description or deadline leaves the stored one as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// `YYYY-MM-DD`, or an RFC 3339 timestamp whose time is dropped.
    #[serde(default)]
    pub deadline: Option<String>,
}

impl TaskRequest {
    /// # Errors
    ///
    /// Returns every invalid field.
    pub fn validate(self) -> Result<TaskPatch, ValidationError> {
        let mut errors = ValidationError::default();
        let title = collect(
            &mut errors,
            required_text("title", "Title", self.title.as_deref()),
        );
        let status = collect(&mut errors, required_status(self.status.as_deref()));
        let deadline = collect(&mut errors, optional_deadline(self.deadline.as_deref()));

        match (title, status, deadline) {
            (Some(title), Some(status), Some(deadline)) => errors.finish(TaskPatch {
                title,
                description: optional_text(self.description.as_deref()),
                status,
                deadline,
            }),
            _ => Err(errors),
        }
    }
}

/// Response DTO for a task with its project and the project's creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub deadline: Option<String>,
    pub created_at: String,
    pub project: ProjectResponse,
}

impl From<&TaskDetail> for TaskResponse {
    fn from(detail: &TaskDetail) -> Self {
        let task = &detail.task;
        Self {
            id: task.task_id.to_string(),
            project_id: task.project_id.to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            deadline: task
                .deadline
                .map(|deadline| deadline.format(DEADLINE_FORMAT).to_string()),
            created_at: task.created_at.to_rfc3339(),
            project: ProjectResponse::from(&detail.project),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub message: String,
    pub task: TaskResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskListEnvelope {
    pub message: String,
    pub tasks: Vec<TaskResponse>,
}

// =============================================================================
// Shared
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
