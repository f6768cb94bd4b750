//! Principal, role, and capability types supplied by the external identity
//! context.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Identifier for a user account issued by the external identity context.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wraps an externally-issued numeric user identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse role attached to a principal.
///
/// Roles are informational here; authorization decisions use the capability
/// set, which the identity context derives from roles however it likes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Manages tasks and assignments for a team.
    Manager,
    /// Works on assigned tasks.
    Staff,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}

/// Error returned while parsing roles from persistence or transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

/// Capability required to perform a task operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create new tasks.
    CreateTasks,
    /// Replace assignee sets and designate main assignees.
    AssignTasks,
    /// Record progress, ticks, and submit work for review.
    UpdateProgress,
    /// Approve or reject work sitting in review.
    ReviewTasks,
    /// Archive tasks from any non-terminal state.
    ArchiveTasks,
    /// Reopen a completed task outside the tick-revert path.
    OverrideStatus,
}

impl Capability {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTasks => "create_tasks",
            Self::AssignTasks => "assign_tasks",
            Self::UpdateProgress => "update_progress",
            Self::ReviewTasks => "review_tasks",
            Self::ArchiveTasks => "archive_tasks",
            Self::OverrideStatus => "override_status",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated caller of a task operation.
///
/// # Examples
///
/// ```rust
/// use workstream::identity::{Capability, Principal, Role, UserId};
///
/// let principal = Principal::new(UserId::new(7), Role::Manager, [Capability::AssignTasks]);
/// assert!(principal.has(Capability::AssignTasks));
/// assert!(!principal.has(Capability::ArchiveTasks));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    role: Role,
    capabilities: BTreeSet<Capability>,
}

impl Principal {
    /// Creates a principal from identity-context data.
    #[must_use]
    pub fn new(
        user_id: UserId,
        role: Role,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            user_id,
            role,
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// Returns the acting user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the principal's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns whether the capability set contains `capability`.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
