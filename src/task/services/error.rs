//! Service-level error type for task workflow operations.

use crate::identity::{Capability, UserId};
use crate::task::domain::TaskDomainError;
use crate::task::ports::{AttachmentCountError, TaskStoreError};
use thiserror::Error;

/// Errors surfaced by the workflow services.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Domain validation failed; the caller can correct and resubmit.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),

    /// The attachment collaborator could not answer.
    #[error(transparent)]
    Attachments(#[from] AttachmentCountError),

    /// The caller's capability set lacks the required entry.
    #[error("user {user_id} lacks capability {capability}")]
    Unauthorized {
        /// The acting user.
        user_id: UserId,
        /// The missing capability.
        capability: Capability,
    },
}

impl WorkflowError {
    /// Returns whether a bounded automatic retry may succeed.
    ///
    /// Only transient store failures qualify; validation errors never do.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Store(TaskStoreError::Conflict { .. } | TaskStoreError::Unavailable(_))
        )
    }
}

/// Result type for workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
