use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::RedditConfig;

/// Errors that end a scan session. All of them are retried by the supervisor.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned status {status}")]
    Status { status: u16 },

    #[error("failed to parse listing: {0}")]
    Parse(String),

    #[error("connection lost: {0}")]
    Connection(String),

    #[error("scan task failed: {0}")]
    Task(String),
}

/// Errors that end the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("scanner failed {attempts} times in a row, giving up")]
    RetryExhausted { attempts: u32 },
}

/// Supervisor state, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SupervisorState {
    /// Scan primitive not started yet.
    Idle,
    /// A scan session is running.
    Scanning,
    /// The last session ended; backing off before the next one.
    Waiting,
    /// Terminal.
    Stopped,
}

/// What to do after a failed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u32, wait: Duration },
    Exhausted { attempts: u32 },
}

/// Consecutive-failure counter with a fixed backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    failures: u32,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryState {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            failures: 0,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &RedditConfig) -> Self {
        Self::new(
            config.max_retry_attempts,
            Duration::from_secs(config.retry_wait_secs),
        )
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Count one more consecutive failure.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.max_attempts {
            RetryDecision::Exhausted {
                attempts: self.failures,
            }
        } else {
            RetryDecision::Retry {
                attempt: self.failures,
                wait: self.backoff,
            }
        }
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_until_exhausted() {
        let mut retry = RetryState::new(3, Duration::from_secs(10));

        assert_eq!(
            retry.record_failure(),
            RetryDecision::Retry {
                attempt: 1,
                wait: Duration::from_secs(10)
            }
        );
        assert_eq!(
            retry.record_failure(),
            RetryDecision::Retry {
                attempt: 2,
                wait: Duration::from_secs(10)
            }
        );
        assert_eq!(
            retry.record_failure(),
            RetryDecision::Exhausted { attempts: 3 }
        );
    }

    #[test]
    fn test_reset_clears_failures() {
        let mut retry = RetryState::new(3, Duration::ZERO);
        retry.record_failure();
        retry.record_failure();
        retry.reset();

        assert_eq!(retry.failures(), 0);
        assert!(matches!(retry.record_failure(), RetryDecision::Retry { attempt: 1, .. }));
    }

    #[test]
    fn test_zero_attempts_is_treated_as_one() {
        let mut retry = RetryState::new(0, Duration::ZERO);
        assert_eq!(retry.max_attempts(), 1);
        assert_eq!(
            retry.record_failure(),
            RetryDecision::Exhausted { attempts: 1 }
        );
    }

    #[test]
    fn test_from_config() {
        let retry = RetryState::from_config(&RedditConfig::default());
        assert_eq!(retry.max_attempts(), 10);
        assert_eq!(retry.backoff(), Duration::from_secs(10));
    }

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SupervisorState::Scanning).unwrap(),
            "\"scanning\""
        );
    }
}
