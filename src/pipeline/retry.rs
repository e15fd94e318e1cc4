// Bounded retries with exponential backoff at the store boundary.
//
// Every store round trip gets a timeout. Timeouts, store errors and version
// conflicts are retried with exponential backoff plus jitter, up to
// `max_retries` extra attempts. Validation and config errors raised by the
// update closure are returned immediately.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::store::KeyValueStore;

/// How hard to try before reporting a persistence failure.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each retry.
    pub base_backoff: Duration,
    /// Cap on the exponential growth.
    pub max_backoff: Duration,
    /// Timeout for a single store round trip.
    pub op_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_backoff: Duration::from_millis(25),
            max_backoff: Duration::from_secs(1),
            op_timeout: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based), with ±25% jitter so
    /// two writers that collided don't collide again in lockstep.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .base_backoff
            .saturating_mul(1u32 << attempt.min(16))
            .min(self.max_backoff);
        let jitter_factor: f64 = rand::random_range(0.75..1.25);
        Duration::from_secs_f64(exp.as_secs_f64() * jitter_factor)
    }
}

/// Run one store operation under the policy's timeout, mapping every failure
/// to `CoreError::Persistence`.
pub async fn with_timeout<T, Fut>(policy: &RetryPolicy, op: Fut) -> CoreResult<T>
where
    Fut: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(policy.op_timeout, op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CoreError::Persistence(format!("{e:#}"))),
        Err(_) => Err(CoreError::Persistence(format!(
            "store operation timed out after {}ms",
            policy.op_timeout.as_millis()
        ))),
    }
}

/// Retry a self-contained store operation (a read or an unconditional write)
/// on transient failure.
pub async fn retry_store<T, F, Fut>(policy: &RetryPolicy, what: &str, op: F) -> CoreResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match with_timeout(policy, op()).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= policy.max_retries {
                    return Err(e);
                }
                attempt += 1;
                let delay = policy.backoff(attempt);
                warn!(
                    op = what,
                    attempt,
                    max_retries = policy.max_retries,
                    error = %e,
                    "Store operation failed, retrying in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Optimistic read-modify-write of one key.
///
/// Reads the current value and version, hands the value to `update`, and
/// writes the result with compare-and-set. If another writer got there
/// first, the whole cycle runs again against the fresh value, so `update`
/// must be free of side effects.
pub async fn read_modify_write<T, F>(
    store: &dyn KeyValueStore,
    policy: &RetryPolicy,
    key: &str,
    mut update: F,
) -> CoreResult<T>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(Option<T>) -> CoreResult<T>,
{
    let mut attempt = 0u32;
    loop {
        let outcome: CoreResult<Option<T>> = async {
            let (expected, current) = match with_timeout(policy, store.get(key)).await? {
                Some(entry) => (Some(entry.version), Some(serde_json::from_value(entry.value)?)),
                None => (None, None),
            };
            let next = update(current)?;
            let json = serde_json::to_value(&next)?;
            let written =
                with_timeout(policy, store.compare_and_set(key, expected, &json)).await?;
            Ok(written.then_some(next))
        }
        .await;

        match outcome {
            Ok(Some(next)) => return Ok(next),
            Ok(None) => debug!(key, attempt, "Version conflict, re-reading"),
            Err(e) if e.is_retryable() => {
                warn!(key, attempt, error = %e, "Store round trip failed");
            }
            Err(e) => return Err(e),
        }

        if attempt >= policy.max_retries {
            return Err(CoreError::Persistence(format!(
                "could not write {key} after {} attempts",
                attempt + 1
            )));
        }
        attempt += 1;
        tokio::time::sleep(policy.backoff(attempt)).await;
    }
}
