//! Exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Run `op` up to `max_attempts` times.
///
/// Only errors accepted by `should_retry` are retried, after
/// `initial_delay * 2^attempt`. Anything else, and the last error once the
/// ceiling is reached, is returned unchanged. `op` receives the zero-based
/// attempt number.
pub async fn with_retry<T, E, F, Fut, P>(
    max_attempts: u32,
    initial_delay: Duration,
    should_retry: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < max_attempts && should_retry(&e) => {
                let delay = backoff_delay(initial_delay, attempt);
                warn!(
                    "Attempt {}/{} failed: {}; retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    initial.saturating_mul(1u32 << attempt.min(16))
}
