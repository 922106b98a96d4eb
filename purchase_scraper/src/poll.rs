//! Poll-with-timeout, the only way this crate waits on the page.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout_at, Instant};

use crate::errors::DriverError;

/// Run `check` until it yields `Some`, or until `timeout` has elapsed.
///
/// The check runs once immediately and then every `interval`. The last sleep
/// is shortened so the final check lands exactly on the deadline. A check
/// still running at the deadline is dropped. Returns `Ok(None)` on timeout;
/// a driver error from the check ends the wait early.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<Option<T>, DriverError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, DriverError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match timeout_at(deadline, check()).await {
            Ok(Ok(Some(value))) => return Ok(Some(value)),
            Ok(Ok(None)) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(None),
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        let remaining = deadline - now;
        sleep(interval.min(remaining)).await;
    }
}
