//! Bounded retry for transient store failures.

use super::error::WorkflowResult;
use std::future::Future;
use std::time::Duration;

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_millis(1_000);

/// Runs `op`, retrying conflict and unavailability failures with doubling
/// backoff until [`MAX_ATTEMPTS`] is exhausted.
///
/// Each attempt re-runs the full snapshot/validate/commit cycle, so a
/// conflicted attempt re-reads fresh state before deciding again.
pub(crate) async fn run_with_retry<T, F, Fut>(mut op: F) -> WorkflowResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WorkflowResult<T>>,
{
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                tracing::debug!(attempt, error = %err, "retrying transient store failure");
                tokio::time::sleep(backoff).await;
                backoff = backoff.saturating_mul(2).min(MAX_BACKOFF);
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}
