use crate::{
    Error, Session, User, UserId,
    login_attempt::LoginAttemptRecord,
    login_log::{LoginLogEntry, NewLoginLogEntry, RecentLogin},
    repositories::{
        LoginAttemptRepository, LoginLogRepository, RepositoryProvider, SessionRepository,
        UserRepository,
    },
    user::{NewUser, UserCredentials},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements individual repository traits
pub struct UserRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> UserRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> UserRepository for UserRepositoryAdapter<R> {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        self.provider.user().create(user).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.provider.user().find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.provider.user().find_by_username(username).await
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, Error> {
        self.provider.user().find_credentials(username).await
    }
}

pub struct SessionRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SessionRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SessionRepository for SessionRepositoryAdapter<R> {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        self.provider.session().create(session).await
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, Error> {
        self.provider.session().find_by_token_hash(token_hash).await
    }

    async fn delete(&self, token_hash: &str) -> Result<(), Error> {
        self.provider.session().delete(token_hash).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.session().delete_expired(now).await
    }
}

pub struct LoginAttemptRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LoginAttemptRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LoginAttemptRepository for LoginAttemptRepositoryAdapter<R> {
    async fn find(&self, ip_address: &str) -> Result<Option<LoginAttemptRecord>, Error> {
        self.provider.login_attempt().find(ip_address).await
    }

    async fn record_failure(
        &self,
        ip_address: &str,
        now: DateTime<Utc>,
        threshold: u32,
        lockout_period: Duration,
    ) -> Result<LoginAttemptRecord, Error> {
        self.provider
            .login_attempt()
            .record_failure(ip_address, now, threshold, lockout_period)
            .await
    }

    async fn clear(&self, ip_address: &str) -> Result<bool, Error> {
        self.provider.login_attempt().clear(ip_address).await
    }
}

pub struct LoginLogRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LoginLogRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LoginLogRepository for LoginLogRepositoryAdapter<R> {
    async fn append(&self, entry: NewLoginLogEntry) -> Result<LoginLogEntry, Error> {
        self.provider.login_log().append(entry).await
    }

    async fn recent(&self, limit: u32) -> Result<Vec<RecentLogin>, Error> {
        self.provider.login_log().recent(limit).await
    }

    async fn for_user(&self, user_id: &UserId, limit: u32) -> Result<Vec<LoginLogEntry>, Error> {
        self.provider.login_log().for_user(user_id, limit).await
    }
}
