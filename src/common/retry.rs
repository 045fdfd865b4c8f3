// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with exponential backoff.
pub async fn retry_async<F, Fut, T, E>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(_) if attempt < attempts => {
                sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
                continue;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub interval: Duration,
}

/// Result of a single attempt driven by [`retry_fixed`].
#[derive(Debug)]
pub enum Attempt<T, E> {
    Done(T),
    /// An expected condition was handled in place; try again without the backoff sleep.
    Recovered,
    Failed(E),
    /// Stop immediately, the remaining attempts cannot succeed.
    Fatal(E),
}

#[derive(Debug)]
pub enum RetryError<E> {
    Fatal(E),
    Exhausted { attempts: usize, last: Option<E> },
}

/// Retry an async operation with a fixed pause between failed attempts.
///
/// Every attempt, recovered ones included, counts against `policy.attempts`.
pub async fn retry_fixed<F, Fut, T, E>(policy: RetryPolicy, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        match op(attempt).await {
            Attempt::Done(v) => return Ok(v),
            Attempt::Fatal(e) => return Err(RetryError::Fatal(e)),
            Attempt::Recovered => continue,
            Attempt::Failed(e) => {
                last = Some(e);
                if attempt < attempts {
                    sleep(policy.interval).await;
                }
            }
        }
    }
    Err(RetryError::Exhausted { attempts, last })
}
