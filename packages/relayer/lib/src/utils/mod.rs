//! This module contains the utilities shared by the relay and orchestration code.

use futures_timer::Delay;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

pub mod serde;

/// Errors returned by [`poll_until`].
#[derive(Debug, Error)]
pub enum PollError {
    /// The probe never yielded a value.
    #[error("condition not met within {0:?}")]
    Timeout(Duration),

    /// The probe failed.
    #[error(transparent)]
    Probe(#[from] anyhow::Error),
}

/// Polls `probe` until it yields a value or `timeout` elapses.
///
/// The probe is always run at least once. A probe error stops polling
/// immediately.
///
/// # Errors
/// [`PollError::Timeout`] if no value was produced in time, or
/// [`PollError::Probe`] with the first probe error.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<T, PollError>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = anyhow::Result<Option<T>>> + Send,
{
    let start = Instant::now();
    loop {
        if let Some(value) = probe().await? {
            return Ok(value);
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(PollError::Timeout(timeout));
        }

        let wait = interval.min(timeout - elapsed);
        tracing::debug!(
            wait_ms = wait.as_millis(),
            "Condition not met. Waiting before retrying"
        );
        Delay::new(wait).await;
    }
}
