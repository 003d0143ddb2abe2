// Path: crates/cli/src/poll.rs

use netctl_types::error::RemoteError;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Generic polling function that waits for an async condition to be met.
///
/// The condition returns `Ok(Some(_))` when done and `Ok(None)` to keep
/// waiting. Errors are treated as transient and only logged; the deadline
/// decides. Expiry yields [`RemoteError::Timeout`].
pub async fn wait_for<F, Fut, T, E>(
    description: &str,
    interval: Duration,
    timeout: Duration,
    mut condition: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
{
    let start = Instant::now();
    loop {
        match condition().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => {
                log::trace!(
                    "Polling for '{}' received transient error: {}",
                    description,
                    e
                );
            }
        }
        if start.elapsed() > timeout {
            return Err(RemoteError::Timeout(format!(
                "waiting for {} ({:?})",
                description, timeout
            )));
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_once_condition_holds() {
        let calls = AtomicU32::new(0);
        let value = wait_for(
            "third call",
            Duration::from_millis(1),
            Duration::from_secs(5),
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                match n {
                    1 => Err("transient"),
                    2 => Ok(None),
                    _ => Ok(Some(n)),
                }
            },
        )
        .await
        .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn times_out_with_description() {
        let err = wait_for::<_, _, (), String>(
            "nothing",
            Duration::from_millis(1),
            Duration::from_millis(10),
            || async { Ok(None) },
        )
        .await
        .unwrap_err();
        match err {
            RemoteError::Timeout(msg) => assert!(msg.contains("nothing")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
