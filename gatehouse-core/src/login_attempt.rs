//! Per-IP failed login tracking
//!
//! Every failed authentication bumps a counter keyed by the client IP address. Once the
//! counter reaches [`LockoutConfig::max_failed_attempts`] the address is blocked for
//! [`LockoutConfig::lockout_period`], measured from the failure that crossed the threshold.
//!
//! | Column                | Type               | Description                                   |
//! | --------------------- | ------------------ | --------------------------------------------- |
//! | `ip_address`          | `String`           | Natural key, unique.                          |
//! | `failed_attempts`     | `u32`              | Failures since the last successful login.     |
//! | `last_failed_attempt` | `DateTime`         | Time of the most recent failure.              |
//! | `blocked_until`       | `Option<DateTime>` | End of the lockout window, `None` if never.   |
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stored failure counter for one client address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttemptRecord {
    pub ip_address: String,
    pub failed_attempts: u32,
    pub last_failed_attempt: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl LoginAttemptRecord {
    /// Block state of this record as seen at `now`.
    ///
    /// An expired `blocked_until` counts as not blocked even though the counter is kept.
    pub fn status_at(&self, now: DateTime<Utc>) -> BlockStatus {
        match self.blocked_until {
            Some(until) if until > now => BlockStatus::Blocked { until },
            _ => BlockStatus::NotBlocked,
        }
    }
}

/// Result of a block check for a client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    NotBlocked,
    Blocked { until: DateTime<Utc> },
}

impl BlockStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, BlockStatus::Blocked { .. })
    }

    /// Whole seconds left in the lockout window, rounded up and never below 1.
    /// `None` when not blocked.
    pub fn retry_after_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            BlockStatus::Blocked { until } => {
                let millis = (*until - now).num_milliseconds();
                Some((millis + 999).div_euclid(1000).max(1))
            }
            BlockStatus::NotBlocked => None,
        }
    }
}

/// Lockout policy shared by every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutConfig {
    /// When false, failures are neither recorded nor enforced.
    pub enabled: bool,
    /// Failures from one address that trigger a block. Always at least 1.
    pub max_failed_attempts: u32,
    /// How long an address stays blocked once the threshold is reached.
    pub lockout_period: Duration,
}

impl LockoutConfig {
    pub fn new(max_failed_attempts: u32, lockout_period: Duration) -> Self {
        Self {
            enabled: true,
            max_failed_attempts: max_failed_attempts.max(1),
            lockout_period,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self::new(5, Duration::minutes(15))
    }
}
