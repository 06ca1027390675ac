//! Transport configuration types.
//!
//! These are the resolved, `Duration`-based settings consumed by the
//! implementations in `emi-transport` and the supervisor in `emi-runtime`.
//! The file-facing schema lives in `emi-runtime::config` and converts into
//! these types.

use std::time::Duration;

/// Retry policy for command calls.
///
/// A call makes at most `max_retries + 1` attempts. The wait before retry
/// number `n` (1-based) is `min(max_delay, base_delay * 2^(n-1) + jitter)`
/// with `jitter` drawn uniformly from `[0, max_jitter)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Exclusive upper bound of the random jitter.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            max_jitter: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Returns the total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Computes the wait before retry number `retry` (1-based) for a given jitter.
    pub fn delay(&self, retry: u32, jitter: Duration) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let backoff = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay);
        backoff.saturating_add(jitter).min(self.max_delay)
    }
}

/// Command client configuration.
#[derive(Debug, Clone)]
pub struct CommandClientConfig {
    /// Base address every endpoint is joined onto.
    pub api_url: String,
    /// Bearer token attached to each call.
    pub access_token: Option<String>,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retry policy.
    pub retry: RetryPolicy,
}

impl CommandClientConfig {
    /// Creates a configuration with default timeout and retry policy.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            access_token: None,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Event stream connection configuration.
#[derive(Debug, Clone)]
pub struct StreamConnectionConfig {
    /// WebSocket URL of the gateway event endpoint.
    pub url: String,
    /// Bearer token sent with the upgrade request.
    pub access_token: Option<String>,
    /// Bound on the TCP connect plus WebSocket handshake.
    pub connect_timeout: Duration,
}

impl StreamConnectionConfig {
    /// Creates a configuration without credentials.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the bearer token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Backoff policy for re-opening a dropped event connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor applied after each failed attempt.
    pub multiplier: f64,
    /// Consecutive failed opens tolerated before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Returns the delay following `current`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_delay);
        next.min(self.max_delay)
    }
}
