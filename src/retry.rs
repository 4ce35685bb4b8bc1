//! Exponential backoff for startup connection attempts.

use std::future::Future;
use std::time::Duration;

/// Doubling delays starting at `initial`, stopping once a delay would reach
/// `ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub ceiling: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            ceiling: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let ceiling = self.ceiling;
        std::iter::successors(Some(self.initial), |d| d.checked_mul(2))
            .take_while(move |d| !d.is_zero() && *d < ceiling)
    }
}

/// Run `op` until it succeeds, sleeping through `backoff` between attempts.
///
/// Returns the last error once every delay has been used. `sleep` is passed
/// in so callers decide how time passes (`tokio::time::sleep` in the binary).
pub async fn retry_with_backoff<T, E, Op, Fut, Sleep, SleepFut>(
    backoff: Backoff,
    mut sleep: Sleep,
    mut op: Op,
) -> Result<T, E>
where
    E: std::fmt::Display,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Sleep: FnMut(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let mut last = match op().await {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    for delay in backoff.delays() {
        tracing::error!(
            "Database connection not ready ({}), retrying in {} seconds",
            last,
            delay.as_secs()
        );
        sleep(delay).await;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => last = err,
        }
    }

    Err(last)
}
