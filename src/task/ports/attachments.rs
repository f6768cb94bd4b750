//! Attachment count port used by the completion guard.
//!
//! Attachment storage lives in an external subsystem; the engine depends
//! only on a per-task count.

use crate::task::domain::TaskId;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::sync::Arc;
use thiserror::Error;

/// Error returned when the attachment collaborator cannot answer.
#[derive(Debug, Clone, Error)]
#[error("attachment count unavailable: {0}")]
pub struct AttachmentCountError(pub Arc<dyn std::error::Error + Send + Sync>);

impl AttachmentCountError {
    /// Wraps a collaborator failure.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}

/// Supplies the number of files attached to a task.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AttachmentCounter: Send + Sync {
    /// Returns the number of files currently attached to the task.
    ///
    /// # Errors
    ///
    /// Returns [`AttachmentCountError`] when the collaborator is
    /// unreachable; the enclosing operation fails without state change.
    async fn attachment_count(&self, task_id: TaskId) -> Result<u32, AttachmentCountError>;
}
