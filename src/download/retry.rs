//! Retry wrapper for transient HTTP failures.
//!
//! Every outbound HTTP call is wrapped at the call site with [`retrying`],
//! which classifies each failure into a [`FailureType`] and re-runs the call
//! with a fixed inter-attempt delay until [`RetryPolicy::max_attempts`] is
//! exhausted. The wrapper covers a single HTTP call, not a multi-step
//! resolve-then-download sequence; a failure partway through link resolution
//! restarts from the failed call only.
//!
//! # Example
//!
//! ```no_run
//! use sci_clone::download::{DownloadError, RetryPolicy, retrying};
//!
//! # async fn example(client: reqwest::Client) -> Result<(), DownloadError> {
//! let policy = RetryPolicy::default();
//! let response = retrying(&policy, || async {
//!     client
//!         .get("https://api.example.org/works")
//!         .send()
//!         .await
//!         .map_err(|e| DownloadError::from_reqwest("https://api.example.org/works", e))
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::DownloadError;

/// Default maximum attempts (including the initial attempt).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed delay between attempts (2 seconds).
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Maximum jitter added to the fixed delay (500ms).
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of HTTP failure types.
///
/// Used to decide whether a failed call should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: network timeout, 5xx server errors, connection refused, 429.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: 404 Not Found, 400 Bad Request, invalid URL, local IO errors.
    Permanent,
}

/// Configuration for the fixed-delay retry wrapper.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `delay`: 2 seconds plus up to 500ms of jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Fixed delay between attempts.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy with custom settings.
    ///
    /// `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Creates a policy with a custom `max_attempts`, keeping the default delay.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the inter-attempt delay with jitter applied.
    ///
    /// Jitter keeps repeated failures from hammering the target at an exact
    /// fixed interval.
    fn next_delay(&self) -> Duration {
        let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
        self.delay + Duration::from_millis(jitter_ms)
    }
}

/// Runs `op`, retrying transient failures per `policy`.
///
/// Permanent failures and exhausted attempts return the last error to the
/// caller unchanged.
///
/// # Errors
///
/// Returns the final [`DownloadError`] once retries are exhausted or the
/// failure is classified as permanent.
pub async fn retrying<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, DownloadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DownloadError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let failure_type = classify_error(&error);
                if failure_type == FailureType::Permanent {
                    debug!(%error, "permanent failure, not retrying");
                    return Err(error);
                }
                if attempt >= policy.max_attempts() {
                    warn!(%error, attempt, "retries exhausted");
                    return Err(error);
                }
                let delay = policy.next_delay();
                debug!(
                    %error,
                    attempt,
                    next_attempt = attempt + 1,
                    delay_ms = delay.as_millis(),
                    "transient failure, will retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Classifies an error into a failure type for retry decisions.
///
/// Timeouts, connection-level errors, 5xx responses, 408, and 429 are
/// transient; everything else (other 4xx, local IO, invalid URLs) is
/// permanent.
#[must_use]
pub fn classify_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::HttpStatus { status, .. } => classify_http_status(*status),
        DownloadError::Timeout { .. } => FailureType::Transient,
        DownloadError::Network { .. } => FailureType::Transient,
        DownloadError::Io { .. } => FailureType::Permanent,
        DownloadError::InvalidUrl { .. } => FailureType::Permanent,
        DownloadError::ClientBuild { .. } => FailureType::Permanent,
    }
}

fn classify_http_status(status: u16) -> FailureType {
    match status {
        408 | 429 => FailureType::Transient,
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        let policy = RetryPolicy::with_max_attempts(0);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_next_delay_within_jitter_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        for _ in 0..100 {
            let delay = policy.next_delay();
            assert!(delay >= Duration::from_millis(100));
            assert!(delay <= Duration::from_millis(600));
        }
    }

    #[test]
    fn test_classify_5xx_transient() {
        for status in [500, 502, 503, 504] {
            let error = DownloadError::http_status("http://example.com", status);
            assert_eq!(classify_error(&error), FailureType::Transient, "{status}");
        }
    }

    #[test]
    fn test_classify_429_and_408_transient() {
        for status in [408, 429] {
            let error = DownloadError::http_status("http://example.com", status);
            assert_eq!(classify_error(&error), FailureType::Transient, "{status}");
        }
    }

    #[test]
    fn test_classify_4xx_permanent() {
        for status in [400, 401, 403, 404, 410] {
            let error = DownloadError::http_status("http://example.com", status);
            assert_eq!(classify_error(&error), FailureType::Permanent, "{status}");
        }
    }

    #[test]
    fn test_classify_timeout_transient() {
        let error = DownloadError::timeout("http://example.com");
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_io_and_invalid_url_permanent() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            classify_error(&DownloadError::io("/tmp/x.pdf", io_err)),
            FailureType::Permanent
        );
        assert_eq!(
            classify_error(&DownloadError::invalid_url("not-a-url")),
            FailureType::Permanent
        );
    }

    #[tokio::test]
    async fn test_retrying_returns_first_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let result = retrying(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, DownloadError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retrying_retries_transient_until_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let result = retrying(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(DownloadError::http_status("http://example.com", 503))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retrying_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retrying(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DownloadError::timeout("http://example.com")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retrying_does_not_retry_permanent() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retrying(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DownloadError::http_status("http://example.com", 404)) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
