//! Repository trait for per-address failed login counters.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::{Error, login_attempt::LoginAttemptRecord};

/// Storage for the `login_attempts` table.
///
/// There is at most one record per client address. Implementations must make
/// [`record_failure`](LoginAttemptRepository::record_failure) a single atomic statement:
/// concurrent failures from the same address must each be counted exactly once.
#[async_trait]
pub trait LoginAttemptRepository: Send + Sync + 'static {
    /// Fetch the record for an address, if any.
    async fn find(&self, ip_address: &str) -> Result<Option<LoginAttemptRecord>, Error>;

    /// Count one failure for an address.
    ///
    /// Inserts a record with a count of 1 or increments the existing one, sets
    /// `last_failed_attempt` to `now`, and sets `blocked_until` to `now + lockout_period`
    /// whenever the new count is at least `threshold`. Below the threshold an existing
    /// `blocked_until` is left untouched.
    ///
    /// # Returns
    ///
    /// The record as it is after the update.
    async fn record_failure(
        &self,
        ip_address: &str,
        now: DateTime<Utc>,
        threshold: u32,
        lockout_period: Duration,
    ) -> Result<LoginAttemptRecord, Error>;

    /// Remove the record for an address. Returns whether one existed.
    async fn clear(&self, ip_address: &str) -> Result<bool, Error>;
}
