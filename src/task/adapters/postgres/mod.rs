//! `PostgreSQL` adapters for task workflow persistence.

mod models;
mod schema;
mod store;

pub use store::{PgTaskStore, TaskPgPool};
