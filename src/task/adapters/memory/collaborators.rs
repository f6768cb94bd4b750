//! In-memory event and attachment collaborators.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::task::{
    domain::TaskId,
    ports::{AttachmentCountError, AttachmentCounter, DomainEvent, EventEmitter},
};

/// Event emitter that records every event for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventEmitter {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl RecordingEventEmitter {
    /// Creates an emitter with an empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event emitted so far.
    #[must_use]
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().map_or_else(|_| Vec::new(), |events| events.clone())
    }
}

#[async_trait]
impl EventEmitter for RecordingEventEmitter {
    async fn emit(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Event emitter that drops everything.
///
/// Emission is best-effort by contract, so embedders without a
/// notification subsystem can plug this in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventEmitter;

impl NullEventEmitter {
    /// Creates the no-op emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventEmitter for NullEventEmitter {
    async fn emit(&self, event: DomainEvent) {
        tracing::debug!(event = event.name(), "event dropped, no emitter configured");
    }
}

/// Attachment counter backed by a fixed per-task table.
///
/// Tasks without an entry count zero attachments.
#[derive(Debug, Clone, Default)]
pub struct FixedAttachmentCounter {
    counts: Arc<RwLock<HashMap<TaskId, u32>>>,
}

impl FixedAttachmentCounter {
    /// Creates a counter with no attachments recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the attachment count reported for `task_id`.
    pub fn set_count(&self, task_id: TaskId, count: u32) {
        if let Ok(mut counts) = self.counts.write() {
            counts.insert(task_id, count);
        }
    }
}

#[async_trait]
impl AttachmentCounter for FixedAttachmentCounter {
    async fn attachment_count(&self, task_id: TaskId) -> Result<u32, AttachmentCountError> {
        let counts = self
            .counts
            .read()
            .map_err(|err| AttachmentCountError::new(std::io::Error::other(err.to_string())))?;
        Ok(counts.get(&task_id).copied().unwrap_or(0))
    }
}
