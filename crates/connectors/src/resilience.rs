//! Resilience utilities for the helpdesk client
//!
//! Provides pacing, timeout and retry with linear backoff. Rate-limit
//! responses are handled outside the retry budget: the server's requested
//! wait is honored and the attempt is not counted. The timeout bounds the
//! network call only, see [`bounded`]; time spent queued on the [`Pacer`]
//! does not count against it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, warn};

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default attempts for transient failures (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay; the wait before attempt n+1 is `base * n`
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;

/// Default minimum gap between two calls
pub const DEFAULT_PACE_MS: u64 = 1000;

/// Default number of 429 waits before giving up
pub const DEFAULT_MAX_RATE_LIMIT_WAITS: u32 = 20;

/// Wait used when a 429 carries no usable `Retry-After`
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Resilience configuration for the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResilienceConfig {
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Maximum attempts for transient failures
    pub max_attempts: u32,
    /// Base delay for linear backoff
    pub retry_base_delay_ms: u64,
    /// Minimum delay between consecutive calls
    pub pace_ms: u64,
    /// How many 429 waits to tolerate for one call
    pub max_rate_limit_waits: u32,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            pace_ms: DEFAULT_PACE_MS,
            max_rate_limit_waits: DEFAULT_MAX_RATE_LIMIT_WAITS,
        }
    }
}

impl ResilienceConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay after failed attempt `attempt` (1-based), growing linearly
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(u64::from(attempt)))
    }

    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }
}

/// Parse a `Retry-After` header given in seconds
pub fn parse_retry_after(value: Option<&str>) -> Duration {
    let secs = value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

/// Enforces a minimum gap between consecutive calls
///
/// Callers queue on the lock, so concurrent callers are spaced out too.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until at least `interval` has passed since the previous call
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            tokio::time::sleep_until(prev + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// How a single attempt failed
#[derive(Debug)]
pub enum Failure<E> {
    /// Worth retrying with backoff
    Transient(E),
    /// Server asked us to slow down; not counted as an attempt
    RateLimited { retry_after: Duration },
    /// The call ran past the timeout; retried like `Transient`
    TimedOut,
    /// Repeating cannot succeed
    Permanent(E),
}

/// Run `call` under `limit`, mapping its error to a transient failure
pub async fn bounded<T, E, Fut>(limit: Duration, call: Fut) -> Result<T, Failure<E>>
where
    Fut: std::future::Future<Output = Result<T, E>>,
{
    match timeout(limit, call).await {
        Ok(result) => result.map_err(Failure::Transient),
        Err(_) => Err(Failure::TimedOut),
    }
}

/// Execute an operation with retry logic
pub async fn execute_with_retry<F, Fut, T, E>(
    config: &ResilienceConfig,
    metrics: &ResilienceMetrics,
    operation_name: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, Failure<E>>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1u32;
    let mut waits = 0u32;

    loop {
        let last_error = match operation().await {
            Ok(value) => {
                metrics.record_success();
                return Ok(value);
            }
            Err(Failure::RateLimited { retry_after }) => {
                if waits >= config.max_rate_limit_waits {
                    metrics.record_failure();
                    error!(
                        operation = operation_name,
                        waits, "server kept rate limiting, giving up"
                    );
                    return Err(RetryError::RateLimited { waits });
                }
                waits += 1;
                metrics.record_rate_limit_wait();
                warn!(
                    operation = operation_name,
                    retry_after_secs = retry_after.as_secs(),
                    waits,
                    "rate limited, waiting"
                );
                tokio::time::sleep(retry_after).await;
                continue;
            }
            Err(Failure::Permanent(e)) => {
                metrics.record_failure();
                warn!(
                    operation = operation_name,
                    attempt,
                    error = %e,
                    "request failed permanently"
                );
                return Err(RetryError::Permanent(e));
            }
            Err(Failure::Transient(e)) => e.to_string(),
            Err(Failure::TimedOut) => {
                metrics.record_timeout();
                "request timed out".to_string()
            }
        };

        if attempt >= max_attempts {
            metrics.record_failure();
            error!(
                operation = operation_name,
                attempts = attempt,
                error = %last_error,
                "request failed, retries exhausted"
            );
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last_error,
            });
        }

        let delay = config.retry_delay(attempt);
        metrics.record_retry();
        warn!(
            operation = operation_name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %last_error,
            "request failed, will retry"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
        debug!(operation = operation_name, attempt, "retrying");
    }
}

/// Error from retry operation
#[derive(Debug)]
pub enum RetryError<E> {
    /// All attempts failed with transient errors
    Exhausted { attempts: u32, last_error: String },
    /// The server never stopped answering 429
    RateLimited { waits: u32 },
    /// Non-retryable error
    Permanent(E),
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                last_error,
            } => write!(f, "failed after {} attempts: {}", attempts, last_error),
            RetryError::RateLimited { waits } => {
                write!(f, "still rate limited after {} waits", waits)
            }
            RetryError::Permanent(e) => write!(f, "permanent error: {}", e),
        }
    }
}

/// Counters for client resilience
#[derive(Debug, Default)]
pub struct ResilienceMetrics {
    /// Calls that finished, successfully or not
    pub requests: AtomicU64,
    /// Successful calls
    pub successes: AtomicU64,
    /// Failed calls (after all retries)
    pub failures: AtomicU64,
    /// Backoff delays taken
    pub retries: AtomicU64,
    /// 429 waits taken
    pub rate_limit_waits: AtomicU64,
    /// Attempts that hit the timeout
    pub timeouts: AtomicU64,
}

impl ResilienceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limit_wait(&self) {
        self.rate_limit_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn rate_limit_waits(&self) -> u64 {
        self.rate_limit_waits.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn config() -> ResilienceConfig {
        ResilienceConfig {
            pace_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_retry_delay_is_linear() {
        let config = ResilienceConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_millis(1000));
        assert_eq!(config.retry_delay(2), Duration::from_millis(2000));
        assert_eq!(config.retry_delay(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("5")), Duration::from_secs(5));
        assert_eq!(parse_retry_after(Some(" 12 ")), Duration::from_secs(12));
        assert_eq!(parse_retry_after(Some("soon")), Duration::from_secs(60));
        assert_eq!(parse_retry_after(None), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let metrics = ResilienceMetrics::new();
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<&str, RetryError<String>> =
            execute_with_retry(&config(), &metrics, "tickets", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(Failure::Transient("HTTP 500".to_string()))
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.retries(), 2);
        // 1000ms after the first failure, 2000ms after the second
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let metrics = ResilienceMetrics::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), RetryError<String>> =
            execute_with_retry(&config(), &metrics, "tickets", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Failure::Transient("HTTP 503".to_string())) }
            })
            .await;

        match result {
            Err(RetryError::Exhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, "HTTP 503");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_does_not_consume_attempts() {
        let metrics = ResilienceMetrics::new();
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let config = ResilienceConfig {
            max_attempts: 1,
            ..config()
        };

        let result: Result<u32, RetryError<String>> =
            execute_with_retry(&config, &metrics, "tickets", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 4 {
                        Err(Failure::RateLimited {
                            retry_after: Duration::from_secs(7),
                        })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(metrics.rate_limit_waits(), 4);
        assert_eq!(metrics.retries(), 0);
        assert_eq!(started.elapsed(), Duration::from_secs(28));
    }

    #[tokio::test(start_paused = true)]
    async fn test_endless_rate_limit_surfaces_error() {
        let metrics = ResilienceMetrics::new();
        let config = ResilienceConfig {
            max_rate_limit_waits: 2,
            ..config()
        };

        let result: Result<(), RetryError<String>> =
            execute_with_retry(&config, &metrics, "tickets", || async {
                Err(Failure::RateLimited {
                    retry_after: Duration::from_secs(1),
                })
            })
            .await;

        assert!(matches!(result, Err(RetryError::RateLimited { waits: 2 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_not_retried() {
        let metrics = ResilienceMetrics::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), RetryError<String>> =
            execute_with_retry(&config(), &metrics, "tickets", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Failure::Permanent("HTTP 401".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.retries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_transient() {
        let metrics = ResilienceMetrics::new();
        let config = ResilienceConfig {
            timeout_secs: 1,
            max_attempts: 2,
            ..config()
        };

        let result: Result<(), RetryError<String>> =
            execute_with_retry(&config, &metrics, "tickets", || {
                bounded(config.timeout(), async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok::<(), String>(())
                })
            })
            .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 2, .. })));
        assert_eq!(metrics.timeouts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_passes_errors_as_transient() {
        let result: Result<(), Failure<String>> =
            bounded(Duration::from_secs(1), async { Err("reset".to_string()) }).await;
        assert!(matches!(result, Err(Failure::Transient(e)) if e == "reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_spaces_calls() {
        let pacer = Pacer::new(Duration::from_millis(1000));
        let started = Instant::now();

        pacer.wait().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
        pacer.wait().await;
        pacer.wait().await;
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
    }
}
