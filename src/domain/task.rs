//! Task domain model.
//!
//! A task always belongs to one project and is only reachable through it.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::project::{ProjectDetail, ProjectId};

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new `TaskId` with a time-ordered UUID (v7).
    #[must_use]
    pub fn generate_v7() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// The status of a task.
///
/// Any status may move to any other status; there is no enforced order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// All statuses, in workflow order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Returns the wire and database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known task status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid status '{0}'. Expected one of: todo, in_progress, done")]
pub struct InvalidTaskStatus(pub String);

impl FromStr for TaskStatus {
    type Err = InvalidTaskStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| InvalidTaskStatus(value.to_string()))
    }
}

// =============================================================================
// Deadline
// =============================================================================

/// Wire format for deadlines.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

/// Error returned when a deadline is not a valid calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid deadline '{0}'. Expected a calendar date in YYYY-MM-DD format")]
pub struct InvalidDeadline(pub String);

/// Parses a deadline, keeping only its date portion.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (whose time component is
/// dropped). Impossible dates such as `2024-02-30` are rejected.
///
/// # Errors
///
/// Returns [`InvalidDeadline`] if `value` is neither form.
pub fn parse_deadline(value: &str) -> Result<NaiveDate, InvalidDeadline> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DEADLINE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|datetime| datetime.date_naive()))
        .map_err(|_| InvalidDeadline(value.to_string()))
}

// =============================================================================
// Task
// =============================================================================

/// The task domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub task_id: TaskId,
    /// Parent project. Immutable after creation.
    pub project_id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `todo` task with no description or deadline.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        project_id: ProjectId,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            project_id,
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            deadline: None,
            created_at,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_deadline(self, deadline: NaiveDate) -> Self {
        Self {
            deadline: Some(deadline),
            ..self
        }
    }

    /// Applies a patch. Identity, parent project and creation time are kept,
    /// as are a description or deadline the patch does not carry.
    #[must_use]
    pub fn apply(self, patch: &TaskPatch) -> Self {
        Self {
            title: patch.title.clone(),
            description: patch.description.clone().or(self.description),
            status: patch.status,
            deadline: patch.deadline.or(self.deadline),
            ..self
        }
    }
}

/// Replacement values for the mutable fields of a task.
///
/// `None` leaves the description or deadline unchanged. There is no way to
/// express a change of identifier or parent project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDate>,
}

// =============================================================================
// Joined view
// =============================================================================

/// A task joined with its project and the project's creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub task: Task,
    pub project: ProjectDetail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("todo", TaskStatus::Todo)]
    #[case("in_progress", TaskStatus::InProgress)]
    #[case("done", TaskStatus::Done)]
    fn test_status_from_str(#[case] input: &str, #[case] expected: TaskStatus) {
        assert_eq!(input.parse::<TaskStatus>(), Ok(expected));
        assert_eq!(expected.as_str(), input);
    }

    #[rstest]
    #[case("TODO")]
    #[case("in-progress")]
    #[case("finished")]
    #[case("")]
    fn test_status_from_str_rejects_unknown(#[case] input: &str) {
        assert_eq!(
            input.parse::<TaskStatus>(),
            Err(InvalidTaskStatus(input.to_string()))
        );
    }

    #[rstest]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[rstest]
    fn test_parse_deadline_plain_date() {
        let date = parse_deadline("2024-02-29").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 2, 29));
    }

    #[rstest]
    fn test_parse_deadline_truncates_timestamp() {
        let date = parse_deadline("2024-03-15T23:30:00+00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[rstest]
    #[case("2024-02-30")]
    #[case("2023-02-29")]
    #[case("2024-13-01")]
    #[case("15/03/2024")]
    #[case("tomorrow")]
    fn test_parse_deadline_rejects_invalid(#[case] input: &str) {
        assert_eq!(
            parse_deadline(input),
            Err(InvalidDeadline(input.to_string()))
        );
    }

    #[rstest]
    fn test_apply_patch_keeps_identity_and_absent_fields() {
        let project_id = ProjectId::generate_v7();
        let original = Task::new(TaskId::generate_v7(), project_id, "Write", Utc::now())
            .with_description("draft")
            .with_deadline(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let patch = TaskPatch {
            title: "Review".to_string(),
            description: None,
            status: TaskStatus::Done,
            deadline: None,
        };

        let patched = original.clone().apply(&patch);

        assert_eq!(patched.task_id, original.task_id);
        assert_eq!(patched.project_id, project_id);
        assert_eq!(patched.created_at, original.created_at);
        assert_eq!(patched.title, "Review");
        assert_eq!(patched.description.as_deref(), Some("draft"));
        assert_eq!(patched.status, TaskStatus::Done);
        assert_eq!(patched.deadline, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[rstest]
    fn test_apply_patch_replaces_supplied_fields() {
        let original = Task::new(TaskId::generate_v7(), ProjectId::generate_v7(), "Write", Utc::now())
            .with_description("draft")
            .with_deadline(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let patch = TaskPatch {
            title: "Write".to_string(),
            description: Some("final".to_string()),
            status: TaskStatus::InProgress,
            deadline: NaiveDate::from_ymd_opt(2024, 6, 30),
        };

        let patched = original.apply(&patch);

        assert_eq!(patched.description.as_deref(), Some("final"));
        assert_eq!(patched.deadline, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    proptest! {
        #[test]
        fn prop_formatted_dates_parse_back(days in 0i64..200_000) {
            let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Days::new(days.unsigned_abs());
            let rendered = date.format(DEADLINE_FORMAT).to_string();
            prop_assert_eq!(parse_deadline(&rendered), Ok(date));
        }
    }
}
