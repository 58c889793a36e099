//! Bounded retry with a fixed delay between attempts.
//!
//! The upstream statistics service fails transiently (capacity limits,
//! timeouts on large requests). [`fetch_with_retry`] re-invokes an operation
//! a configurable number of times, sleeping a fixed interval in between, and
//! surfaces a single [`FetchError`] carrying the last underlying failure once
//! the budget is spent.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::data_source::{TradeSourceError, TradeSourceErrorKind};
use crate::session::Session;

const SLOW_FETCH_NOTICE: &str =
    "The trade statistics service is responding slowly; still retrying the request.";

/// Configuration for the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of calls, including the first one.
    pub max_attempts: u32,
    /// Fixed pause between a failed attempt and the next one.
    pub retry_interval: Duration,
    /// Overall budget across all attempts and pauses.
    pub deadline: Option<Duration>,
    /// Number of failed attempts after which the session's one-time
    /// slow-fetch notice fires. `None` disables the notice.
    pub slow_notice_after: Option<u32>,
    /// End the loop on the first non-retryable failure instead of spending
    /// the whole budget.
    pub stop_on_permanent: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_interval: Duration::from_millis(500),
            deadline: None,
            slow_notice_after: Some(3),
            stop_on_permanent: false,
        }
    }
}

impl RetryConfig {
    /// Fixed-delay configuration with an explicit attempt budget.
    pub fn fixed(retry_interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            retry_interval,
            ..Self::default()
        }
    }

    /// Ten attempts, half a second apart, for large requests.
    pub fn patient() -> Self {
        Self::fixed(Duration::from_millis(500), 10)
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_slow_notice_after(mut self, failures: Option<u32>) -> Self {
        self.slow_notice_after = failures;
        self
    }

    pub fn with_stop_on_permanent(mut self, stop: bool) -> Self {
        self.stop_on_permanent = stop;
        self
    }
}

/// Terminal failure after the retry budget is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    label: String,
    attempts: u32,
    last: TradeSourceError,
}

impl FetchError {
    pub fn new(label: impl Into<String>, attempts: u32, last: TradeSourceError) -> Self {
        Self {
            label: label.into(),
            attempts,
            last,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of calls actually made.
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The most recent underlying failure.
    pub fn last_error(&self) -> &TradeSourceError {
        &self.last
    }

    pub const fn kind(&self) -> TradeSourceErrorKind {
        self.last.kind()
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed after {} attempt{}: {}",
            self.label,
            self.attempts,
            if self.attempts == 1 { "" } else { "s" },
            self.last
        )
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.last)
    }
}

/// Invokes `operation` until it succeeds or the budget in `config` runs out.
///
/// Every failure is retried unless [`RetryConfig::stop_on_permanent`] is set,
/// in which case non-retryable failures end the loop at once.
pub async fn fetch_with_retry<T, F, Fut>(
    session: &Session,
    config: &RetryConfig,
    label: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TradeSourceError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let started = Instant::now();
    let mut attempts = 0_u32;
    let mut last_error: Option<TradeSourceError> = None;

    loop {
        let remaining = config
            .deadline
            .map(|deadline| deadline.saturating_sub(started.elapsed()));

        if remaining == Some(Duration::ZERO) {
            let error = last_error.unwrap_or_else(|| {
                TradeSourceError::timeout(format!("{label}: deadline elapsed before first attempt"))
            });
            return Err(FetchError::new(label, attempts, error));
        }

        attempts += 1;
        let outcome = match remaining {
            Some(budget) => match tokio::time::timeout(budget, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(TradeSourceError::timeout(format!(
                    "deadline of {}ms exceeded",
                    config.deadline.unwrap_or_default().as_millis()
                ))),
            },
            None => operation().await,
        };

        let error = match outcome {
            Ok(value) => {
                if attempts > 1 {
                    tracing::info!(label, attempts, "fetch succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        tracing::warn!(
            label,
            attempt = attempts,
            max_attempts,
            code = error.code(),
            error = %error.message(),
            "fetch attempt failed"
        );

        let permanent = config.stop_on_permanent && !error.retryable();
        if permanent || attempts >= max_attempts {
            return Err(FetchError::new(label, attempts, error));
        }

        if config
            .slow_notice_after
            .is_some_and(|threshold| attempts >= threshold)
        {
            session.notify_once(SLOW_FETCH_NOTICE);
        }

        last_error = Some(error);

        let mut pause = config.retry_interval;
        if let Some(deadline) = config.deadline {
            pause = pause.min(deadline.saturating_sub(started.elapsed()));
        }
        tokio::time::sleep(pause).await;
    }
}
