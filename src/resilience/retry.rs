use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::ResilienceConfig;
use crate::error::OracleResult;

/// Bounded retry with escalating backoff for transient oracle failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    /// Backoff before retry `n` is `delays[n - 1]`, saturating at the last entry.
    pub delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Build from resilience settings
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delays: config
                .retry_delays_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }

    /// Backoff before the given retry (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let index = retry.saturating_sub(1) as usize;
        self.delays
            .get(index)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// Non-transient failures surface immediately. Returns the result along
    /// with the number of retries that were performed.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> (OracleResult<T>, u32)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = OracleResult<T>>,
    {
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(value) => return (Ok(value), retries),
                Err(e) if e.is_transient() && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.delay_for(retries);
                    warn!(
                        operation = %label,
                        error = %e,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "Transient oracle failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (Err(e), retries),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient() -> OracleError {
        OracleError::Unavailable {
            message: "rate limit exceeded".to_string(),
        }
    }

    fn permanent() -> OracleError {
        OracleError::InvalidResponse {
            message: "bad shape".to_string(),
        }
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.delay_for(1), Duration::from_millis(700));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_retried_until_success() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let (result, retries) = policy
            .run("generate", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(retries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(2200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_exhausts_retries() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let (result, retries) = policy
            .run("generate", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(transient())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(retries, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let (result, retries) = policy
            .run("generate", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(permanent())
            })
            .await;

        assert!(matches!(result, Err(OracleError::InvalidResponse { .. })));
        assert_eq!(retries, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
