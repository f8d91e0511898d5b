use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::client::HttpReply;

/// Bounded retry on transient server errors.
///
/// Only replies whose status is listed in `retryable_statuses` are retried;
/// transport errors and every other status end the sequence immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Wait after the first failed attempt.
    pub initial_backoff: Duration,
    /// Multiplier applied to the wait for each further attempt.
    pub backoff_factor: f64,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(2),
            backoff_factor: 2.0,
            retryable_statuses: vec![500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::from_secs_f64(secs)
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Runs `attempt` until it returns a non-retryable reply or the attempt
    /// budget is spent.
    ///
    /// Returns the last reply together with the number of attempts made.
    /// A `max_attempts` of 0 still makes one attempt.
    pub async fn execute<F, Fut, E>(&self, mut attempt: F) -> Result<(HttpReply, u32), E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<HttpReply, E>>,
    {
        let max = self.max_attempts.max(1);
        let mut n = 1;
        loop {
            let reply = attempt(n).await?;
            if !self.is_retryable(reply.status) || n >= max {
                return Ok((reply, n));
            }

            let delay = self.delay_for_attempt(n);
            warn!(
                attempt = n,
                status = reply.status,
                delay_secs = delay.as_secs_f64(),
                "retryable HTTP status, backing off"
            );
            tokio::time::sleep(delay).await;
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 5);
        assert!(p.is_retryable(503));
        assert!(p.is_retryable(500));
        assert!(!p.is_retryable(429));
        assert!(!p.is_retryable(400));
    }

    #[test]
    fn backoff_doubles() {
        let p = RetryPolicy::default();
        let delays: Vec<u64> = (1..=4).map(|a| p.delay_for_attempt(a).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8, 16]);
    }

    fn scripted(statuses: Vec<u16>) -> (Arc<AtomicU32>, impl FnMut(u32) -> std::future::Ready<Result<HttpReply, ()>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let f = move |_n: u32| {
            let i = c.fetch_add(1, Ordering::SeqCst) as usize;
            let status = statuses.get(i).copied().unwrap_or(200);
            std::future::ready(Ok(HttpReply::new(status, "")))
        };
        (calls, f)
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_fifth_attempt() {
        let (calls, f) = scripted(vec![503, 503, 503, 503, 200]);
        let start = tokio::time::Instant::now();

        let (reply, attempts) = RetryPolicy::default().execute(f).await.unwrap();
        assert!(reply.is_success());
        assert_eq!(attempts, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(2 + 4 + 8 + 16));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_budget() {
        let (calls, f) = scripted(vec![503; 10]);

        let (reply, attempts) = RetryPolicy::default().execute(f).await.unwrap();
        assert_eq!(reply.status, 503);
        assert_eq!(attempts, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_status_returns_at_once() {
        let (calls, f) = scripted(vec![413]);

        let (reply, attempts) = RetryPolicy::default().execute(f).await.unwrap();
        assert_eq!(reply.status, 413);
        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transport_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(HttpReply, u32), &str> = RetryPolicy::default()
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("connection reset") }
            })
            .await;
        assert_eq!(result.unwrap_err(), "connection reset");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
