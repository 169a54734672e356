//! Per-IP brute force protection around password authentication.
//!
//! Every authentication attempt is mediated by a persistent counter keyed by the client
//! address:
//!
//! - A blocked address is rejected before any credential is looked at
//! - Every failed attempt, for existing and unknown usernames alike, bumps the counter
//! - Reaching the threshold blocks the address for the configured lockout period
//! - A successful login deletes the counter and appends to the login history
//!
//! # Example
//!
//! ```rust,ignore
//! use gatehouse_core::{LockoutConfig, LoginContext, services::LoginGuardService};
//!
//! let guard = LoginGuardService::new(users, attempts, logs, LockoutConfig::default());
//!
//! let ctx = LoginContext::new("1.2.3.4", clock.now());
//! match guard.authenticate("alice", "hunter22", &ctx).await {
//!     Ok(user) => { /* create a session */ }
//!     Err(e) if e.blocked_until().is_some() => { /* show the lockout message */ }
//!     Err(e) => { /* generic failure */ }
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error, User,
    context::LoginContext,
    crypto,
    error::{AuthError, ValidationError},
    login_attempt::{BlockStatus, LockoutConfig, LoginAttemptRecord},
    login_log::NewLoginLogEntry,
    repositories::{LoginAttemptRepository, LoginLogRepository, UserRepository},
};

/// Service deciding whether a login attempt may proceed, and tracking its outcome.
///
/// # Thread Safety
///
/// The service holds no mutable state of its own. Concurrent failures from one address
/// are serialized by the repository's atomic upsert.
pub struct LoginGuardService<U, A, L>
where
    U: UserRepository,
    A: LoginAttemptRepository,
    L: LoginLogRepository,
{
    users: Arc<U>,
    attempts: Arc<A>,
    logs: Arc<L>,
    config: LockoutConfig,
}

impl<U, A, L> LoginGuardService<U, A, L>
where
    U: UserRepository,
    A: LoginAttemptRepository,
    L: LoginLogRepository,
{
    pub fn new(users: Arc<U>, attempts: Arc<A>, logs: Arc<L>, config: LockoutConfig) -> Self {
        Self {
            users,
            attempts,
            logs,
            config,
        }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    /// Block state of an address at `now`.
    ///
    /// Storage failures are returned as errors, never mapped to either answer.
    pub async fn is_blocked(&self, ip_address: &str, now: DateTime<Utc>) -> Result<BlockStatus, Error> {
        if !self.config.enabled {
            return Ok(BlockStatus::NotBlocked);
        }

        let record = self.attempts.find(ip_address).await?;
        Ok(record
            .map(|r| r.status_at(now))
            .unwrap_or(BlockStatus::NotBlocked))
    }

    /// The stored counter for an address, if any.
    pub async fn attempt_record(&self, ip_address: &str) -> Result<Option<LoginAttemptRecord>, Error> {
        self.attempts.find(ip_address).await
    }

    /// Count one failed attempt for an address.
    ///
    /// Returns `None` when protection is disabled and nothing was recorded.
    pub async fn record_failure(
        &self,
        ip_address: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LoginAttemptRecord>, Error> {
        if !self.config.enabled {
            return Ok(None);
        }

        let record = self
            .attempts
            .record_failure(
                ip_address,
                now,
                self.config.max_failed_attempts,
                self.config.lockout_period,
            )
            .await?;

        if let BlockStatus::Blocked { until } = record.status_at(now) {
            tracing::warn!(
                ip_address = %ip_address,
                failed_attempts = record.failed_attempts,
                blocked_until = %until,
                "Client address blocked after repeated login failures"
            );
        } else {
            tracing::debug!(
                ip_address = %ip_address,
                failed_attempts = record.failed_attempts,
                "Recorded failed login attempt"
            );
        }

        Ok(Some(record))
    }

    /// Delete the counter for an address.
    pub async fn reset(&self, ip_address: &str) -> Result<(), Error> {
        self.attempts.clear(ip_address).await?;
        Ok(())
    }

    /// Lift a block by deleting the counter.
    ///
    /// # Returns
    ///
    /// `true` if the address was blocked at `now`.
    pub async fn unblock(&self, ip_address: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        let was_blocked = self
            .attempts
            .find(ip_address)
            .await?
            .is_some_and(|r| r.status_at(now).is_blocked());
        self.attempts.clear(ip_address).await?;

        if was_blocked {
            tracing::info!(ip_address = %ip_address, "Client address unblocked");
        }

        Ok(was_blocked)
    }

    /// Run one login attempt.
    ///
    /// The block check comes first; a blocked address never reaches password
    /// verification. Unknown usernames and wrong passwords both answer
    /// [`AuthError::InvalidCredentials`] and both count as a failure.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        ctx: &LoginContext,
    ) -> Result<User, Error> {
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingField(
                "Please enter both username and password.".to_string(),
            )
            .into());
        }

        if let BlockStatus::Blocked { until } = self.is_blocked(&ctx.ip_address, ctx.at).await? {
            tracing::info!(
                ip_address = %ctx.ip_address,
                blocked_until = %until,
                "Rejected login attempt from blocked address"
            );
            return Err(AuthError::Blocked { until }.into());
        }

        let verified = match self.users.find_credentials(username).await? {
            Some(credentials) => crypto::verify_password(password, &credentials.password_hash)
                .then_some(credentials.user),
            None => {
                crypto::verify_dummy_password(password);
                None
            }
        };

        let Some(user) = verified else {
            self.record_failure(&ctx.ip_address, ctx.at).await?;
            return Err(AuthError::InvalidCredentials.into());
        };

        if self.config.enabled {
            self.reset(&ctx.ip_address).await?;
        }

        self.logs
            .append(NewLoginLogEntry {
                user_id: user.id,
                ip_address: ctx.ip_address.clone(),
                login_time: ctx.at,
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            ip_address = %ctx.ip_address,
            "User logged in"
        );

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        UserId,
        error::StorageError,
        login_log::{LoginLogEntry, RecentLogin},
        user::{NewUser, Role, UserCredentials},
    };
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockUserRepository {
        credentials: Mutex<Vec<UserCredentials>>,
    }

    impl MockUserRepository {
        fn with_user(username: &str, password: &str, role: Role) -> Self {
            let user = User {
                id: UserId::new(1),
                username: username.to_string(),
                role,
                created_at: Utc::now(),
            };
            Self {
                credentials: Mutex::new(vec![UserCredentials {
                    user,
                    password_hash: crypto::hash_password(password),
                }]),
            }
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, _user: NewUser) -> Result<User, Error> {
            unimplemented!()
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
            let credentials = self.credentials.lock().unwrap();
            Ok(credentials
                .iter()
                .find(|c| c.user.id == *id)
                .map(|c| c.user.clone()))
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
            Ok(self.find_credentials(username).await?.map(|c| c.user))
        }

        async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, Error> {
            let credentials = self.credentials.lock().unwrap();
            Ok(credentials
                .iter()
                .find(|c| c.user.username == username)
                .cloned())
        }
    }

    /// Applies the same rules as the SQL upsert, under one lock.
    #[derive(Default)]
    struct MockLoginAttemptRepository {
        records: Mutex<HashMap<String, LoginAttemptRecord>>,
        unavailable: Mutex<bool>,
    }

    impl MockLoginAttemptRepository {
        fn count(&self, ip: &str) -> u32 {
            self.records
                .lock()
                .unwrap()
                .get(ip)
                .map(|r| r.failed_attempts)
                .unwrap_or(0)
        }

        fn check_available(&self) -> Result<(), Error> {
            if *self.unavailable.lock().unwrap() {
                return Err(StorageError::Unavailable("pool timed out".to_string()).into());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LoginAttemptRepository for MockLoginAttemptRepository {
        async fn find(&self, ip_address: &str) -> Result<Option<LoginAttemptRecord>, Error> {
            self.check_available()?;
            Ok(self.records.lock().unwrap().get(ip_address).cloned())
        }

        async fn record_failure(
            &self,
            ip_address: &str,
            now: DateTime<Utc>,
            threshold: u32,
            lockout_period: Duration,
        ) -> Result<LoginAttemptRecord, Error> {
            self.check_available()?;
            let mut records = self.records.lock().unwrap();
            let record = records
                .entry(ip_address.to_string())
                .or_insert_with(|| LoginAttemptRecord {
                    ip_address: ip_address.to_string(),
                    failed_attempts: 0,
                    last_failed_attempt: now,
                    blocked_until: None,
                });
            record.failed_attempts += 1;
            record.last_failed_attempt = now;
            if record.failed_attempts >= threshold {
                record.blocked_until = Some(now + lockout_period);
            }
            Ok(record.clone())
        }

        async fn clear(&self, ip_address: &str) -> Result<bool, Error> {
            self.check_available()?;
            Ok(self.records.lock().unwrap().remove(ip_address).is_some())
        }
    }

    #[derive(Default)]
    struct MockLoginLogRepository {
        entries: Mutex<Vec<LoginLogEntry>>,
    }

    #[async_trait]
    impl LoginLogRepository for MockLoginLogRepository {
        async fn append(&self, entry: NewLoginLogEntry) -> Result<LoginLogEntry, Error> {
            let mut entries = self.entries.lock().unwrap();
            let entry = LoginLogEntry {
                id: entries.len() as i64 + 1,
                user_id: entry.user_id,
                ip_address: entry.ip_address,
                login_time: entry.login_time,
            };
            entries.push(entry.clone());
            Ok(entry)
        }

        async fn recent(&self, _limit: u32) -> Result<Vec<RecentLogin>, Error> {
            Ok(Vec::new())
        }

        async fn for_user(&self, user_id: &UserId, limit: u32) -> Result<Vec<LoginLogEntry>, Error> {
            let entries = self.entries.lock().unwrap();
            Ok(entries
                .iter()
                .rev()
                .filter(|e| e.user_id == *user_id)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    type TestGuard =
        LoginGuardService<MockUserRepository, MockLoginAttemptRepository, MockLoginLogRepository>;

    struct Harness {
        guard: TestGuard,
        attempts: Arc<MockLoginAttemptRepository>,
        logs: Arc<MockLoginLogRepository>,
    }

    fn harness(config: LockoutConfig) -> Harness {
        let users = Arc::new(MockUserRepository::with_user("alice", "secret1", Role::User));
        let attempts = Arc::new(MockLoginAttemptRepository::default());
        let logs = Arc::new(MockLoginLogRepository::default());
        Harness {
            guard: LoginGuardService::new(users, attempts.clone(), logs.clone(), config),
            attempts,
            logs,
        }
    }

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    const IP: &str = "1.2.3.4";

    #[tokio::test]
    async fn test_unknown_address_not_blocked() {
        let h = harness(LockoutConfig::default());
        let status = h.guard.is_blocked(IP, start()).await.unwrap();
        assert_eq!(status, BlockStatus::NotBlocked);
    }

    #[tokio::test]
    async fn test_below_threshold_never_blocked() {
        let h = harness(LockoutConfig::new(3, Duration::minutes(30)));
        let now = start();

        for i in 1..3 {
            let record = h.guard.record_failure(IP, now).await.unwrap().unwrap();
            assert_eq!(record.failed_attempts, i);
            assert_eq!(record.blocked_until, None);
            assert!(!h.guard.is_blocked(IP, now).await.unwrap().is_blocked());
        }
    }

    #[tokio::test]
    async fn test_block_starts_at_threshold_failure() {
        let h = harness(LockoutConfig::new(3, Duration::minutes(30)));
        let t0 = start();

        h.guard.record_failure(IP, t0).await.unwrap();
        h.guard.record_failure(IP, t0 + Duration::seconds(10)).await.unwrap();
        let third = t0 + Duration::seconds(20);
        h.guard.record_failure(IP, third).await.unwrap();

        assert_eq!(
            h.guard.is_blocked(IP, third).await.unwrap(),
            BlockStatus::Blocked {
                until: third + Duration::minutes(30)
            }
        );
    }

    #[tokio::test]
    async fn test_threshold_of_one_blocks_on_first_failure() {
        let h = harness(LockoutConfig::new(1, Duration::minutes(5)));
        let record = h.guard.record_failure(IP, start()).await.unwrap().unwrap();
        assert_eq!(record.blocked_until, Some(start() + Duration::minutes(5)));
    }

    #[tokio::test]
    async fn test_block_expires_without_further_failures() {
        let h = harness(LockoutConfig::new(2, Duration::minutes(15)));
        let t0 = start();
        h.guard.record_failure(IP, t0).await.unwrap();
        h.guard.record_failure(IP, t0).await.unwrap();

        let until = t0 + Duration::minutes(15);
        assert!(h.guard.is_blocked(IP, until - Duration::seconds(1)).await.unwrap().is_blocked());
        assert!(!h.guard.is_blocked(IP, until).await.unwrap().is_blocked());
        assert_eq!(h.attempts.count(IP), 2);
    }

    #[tokio::test]
    async fn test_blocked_address_rejected_with_correct_password() {
        let h = harness(LockoutConfig::new(1, Duration::minutes(15)));
        let now = start();
        h.guard.record_failure(IP, now).await.unwrap();

        let err = h
            .guard
            .authenticate("alice", "secret1", &LoginContext::new(IP, now))
            .await
            .unwrap_err();

        assert_eq!(err.blocked_until(), Some(now + Duration::minutes(15)));
        assert_eq!(h.attempts.count(IP), 1);
        assert!(h.logs.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_and_wrong_password_look_the_same() {
        let h = harness(LockoutConfig::default());
        let ctx = LoginContext::new(IP, start());

        let unknown = h.guard.authenticate("mallory", "secret1", &ctx).await.unwrap_err();
        let wrong = h.guard.authenticate("alice", "wrong-pass", &ctx).await.unwrap_err();

        assert!(matches!(unknown, Error::Auth(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Error::Auth(AuthError::InvalidCredentials)));
        assert_eq!(h.attempts.count(IP), 2);
    }

    #[tokio::test]
    async fn test_empty_credentials_not_counted() {
        let h = harness(LockoutConfig::default());
        let ctx = LoginContext::new(IP, start());

        let err = h.guard.authenticate("", "secret1", &ctx).await.unwrap_err();
        assert!(err.is_validation_error());
        let err = h.guard.authenticate("alice", "", &ctx).await.unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(h.attempts.count(IP), 0);
    }

    #[tokio::test]
    async fn test_success_logs_and_resets_counter() {
        let h = harness(LockoutConfig::default());
        let now = start();
        h.guard.record_failure(IP, now).await.unwrap();

        let user = h
            .guard
            .authenticate("alice", "secret1", &LoginContext::new(IP, now))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert!(h.guard.attempt_record(IP).await.unwrap().is_none());
        let entries = h.logs.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ip_address, IP);
        assert_eq!(entries[0].login_time, now);
    }

    #[tokio::test]
    async fn test_lockout_scenario() {
        let h = harness(LockoutConfig::new(5, Duration::minutes(15)));
        let t0 = start();
        let ctx = LoginContext::new(IP, t0);

        for _ in 0..4 {
            h.guard.authenticate("alice", "forgotten", &ctx).await.unwrap_err();
        }
        assert_eq!(h.guard.is_blocked(IP, t0).await.unwrap(), BlockStatus::NotBlocked);

        h.guard.authenticate("alice", "forgotten", &ctx).await.unwrap_err();
        assert_eq!(
            h.guard.is_blocked(IP, t0).await.unwrap(),
            BlockStatus::Blocked {
                until: t0 + Duration::minutes(15)
            }
        );

        let later = LoginContext::new(IP, t0 + Duration::minutes(1));
        let err = h.guard.authenticate("alice", "secret1", &later).await.unwrap_err();
        assert!(err.blocked_until().is_some());

        let much_later = LoginContext::new(IP, t0 + Duration::minutes(16));
        let user = h.guard.authenticate("alice", "secret1", &much_later).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(h.attempts.count(IP), 0);
    }

    #[tokio::test]
    async fn test_other_addresses_unaffected() {
        let h = harness(LockoutConfig::new(1, Duration::minutes(15)));
        h.guard.record_failure(IP, start()).await.unwrap();

        let user = h
            .guard
            .authenticate("alice", "secret1", &LoginContext::new("5.6.7.8", start()))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert!(h.guard.is_blocked(IP, start()).await.unwrap().is_blocked());
    }

    #[tokio::test]
    async fn test_storage_unavailable_fails_closed() {
        let h = harness(LockoutConfig::default());
        *h.attempts.unavailable.lock().unwrap() = true;

        let err = h
            .guard
            .authenticate("alice", "secret1", &LoginContext::new(IP, start()))
            .await
            .unwrap_err();
        assert!(err.is_storage_unavailable());
        assert!(h.logs.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_protection_does_not_record() {
        let h = harness(LockoutConfig::disabled());
        let ctx = LoginContext::new(IP, start());

        for _ in 0..10 {
            h.guard.authenticate("alice", "wrong-pass", &ctx).await.unwrap_err();
        }
        assert_eq!(h.attempts.count(IP), 0);
        assert!(!h.guard.is_blocked(IP, start()).await.unwrap().is_blocked());
    }

    #[tokio::test]
    async fn test_unblock_returns_was_blocked() {
        let h = harness(LockoutConfig::new(2, Duration::minutes(15)));
        let now = start();

        assert!(!h.guard.unblock(IP, now).await.unwrap());

        h.guard.record_failure(IP, now).await.unwrap();
        h.guard.record_failure(IP, now).await.unwrap();
        assert!(h.guard.unblock(IP, now).await.unwrap());
        assert!(!h.guard.is_blocked(IP, now).await.unwrap().is_blocked());
        assert_eq!(h.attempts.count(IP), 0);
    }
}
