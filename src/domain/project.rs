//! Project domain model.
//!
//! A project is owned by exactly one user (its creator) and groups tasks.
//! Ownership is fixed at creation and never transferred.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::{UserId, UserProfile};

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a `ProjectId` from an existing UUID.
    ///
    /// This does not generate a new UUID; use `ProjectId::generate_v7()`
    /// for that.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new `ProjectId` with a time-ordered UUID (v7).
    #[must_use]
    pub fn generate_v7() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

// =============================================================================
// Project
// =============================================================================

/// The project domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub project_id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    /// The owning user. Immutable after creation.
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project without a description.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id,
            name: name.into(),
            description: None,
            created_by,
            created_at,
        }
    }

    /// Returns a new project with the given description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    /// Returns `true` if `user_id` is the creator of this project.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.created_by == *user_id
    }

    /// Applies a patch, leaving fields the patch does not carry untouched.
    #[must_use]
    pub fn apply(self, patch: &ProjectPatch) -> Self {
        Self {
            name: patch.name.clone().unwrap_or(self.name),
            description: patch.description.clone().or(self.description),
            ..self
        }
    }
}

/// Field-level update for a project.
///
/// `None` leaves a field unchanged. A description, once set, can be
/// replaced but not removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProjectPatch {
    /// Returns `true` if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

// =============================================================================
// Joined view
// =============================================================================

/// A project joined with its creator's public profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetail {
    pub project: Project,
    pub creator: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn project() -> Project {
        Project::new(
            ProjectId::generate_v7(),
            "Alpha",
            UserId::generate_v7(),
            Utc::now(),
        )
        .with_description("x")
    }

    #[rstest]
    fn test_is_owned_by_creator_only() {
        let project = project();
        assert!(project.is_owned_by(&project.created_by));
        assert!(!project.is_owned_by(&UserId::generate_v7()));
    }

    #[rstest]
    fn test_apply_empty_patch_keeps_fields() {
        let original = project();
        let patched = original.clone().apply(&ProjectPatch::default());
        assert_eq!(patched, original);
    }

    #[rstest]
    fn test_apply_patch_updates_name_and_keeps_description() {
        let original = project();
        let patch = ProjectPatch {
            name: Some("Beta".to_string()),
            description: None,
        };

        let patched = original.clone().apply(&patch);

        assert_eq!(patched.name, "Beta");
        assert_eq!(patched.description.as_deref(), Some("x"));
        assert_eq!(patched.project_id, original.project_id);
        assert_eq!(patched.created_by, original.created_by);
    }

    #[rstest]
    fn test_apply_patch_keeps_name_when_absent() {
        let patch = ProjectPatch {
            name: None,
            description: Some("new".to_string()),
        };

        let patched = project().apply(&patch);

        assert_eq!(patched.name, "Alpha");
        assert_eq!(patched.description.as_deref(), Some("new"));
    }
}
