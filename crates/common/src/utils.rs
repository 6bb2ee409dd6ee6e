//! Stateless helpers used by the suites

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Unique timestamp-based id, e.g. `test-1718000000000`.
pub fn generate_unique_id() -> String {
    format!("test-{}", chrono::Utc::now().timestamp_millis())
}

/// Re-invoke `action` up to `max_attempts` times with a fixed `delay` between
/// attempts. Returns the first success, or the last error once every attempt
/// has failed. `max_attempts == 0` behaves like a single attempt.
pub async fn retry_action<T, E, F, Fut>(max_attempts: u32, delay: Duration, mut action: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match action().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "Attempt failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Screenshot name of the form `<context>/<name>-<timestamp>`.
pub fn screenshot_name(name: &str, context: Option<&str>, timestamp_ms: i64) -> String {
    match context {
        Some(ctx) => format!("{}/{}-{}", ctx, name, timestamp_ms),
        None => format!("{}-{}", name, timestamp_ms),
    }
}

/// `name` tagged with the current wall-clock millis.
pub fn timestamped(name: &str) -> String {
    screenshot_name(name, None, chrono::Utc::now().timestamp_millis())
}

/// Log a named test step.
pub fn log_step(step: &str) {
    info!(step, "🔹 step");
}

/// Advisory cleanup; the data layer gives no cleanup guarantee.
pub fn cleanup_test_data(pattern: &str) {
    info!(pattern, "Cleaning up test data matching pattern");
}

/// Fixed pause used where no readiness signal exists.
pub async fn wait_for_network_idle(duration: Duration) {
    tokio::time::sleep(duration).await;
}
