//! Unit and service tests for the task workflow engine.

mod overdue_tests;
mod status_service_tests;
mod support;
