//! In-memory adapters for tests and lightweight embedding.

mod collaborators;
mod store;

pub use collaborators::{FixedAttachmentCounter, NullEventEmitter, RecordingEventEmitter};
pub use store::InMemoryTaskStore;
