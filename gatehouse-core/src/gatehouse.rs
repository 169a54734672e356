//! Application entry point tying the services to one storage backend
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    Error, Session, User, UserId,
    context::LoginContext,
    login_attempt::{BlockStatus, LockoutConfig, LoginAttemptRecord},
    login_log::{LoginLogEntry, RecentLogin},
    repositories::{
        LoginAttemptRepositoryAdapter, LoginLogRepository, LoginLogRepositoryAdapter,
        RepositoryProvider, SessionRepositoryAdapter, UserRepositoryAdapter,
    },
    services::{LoginGuardService, SessionService, UserService},
    session::{SessionConfig, SessionToken},
    validation::RegistrationInput,
};

type Guard<R> = LoginGuardService<
    UserRepositoryAdapter<R>,
    LoginAttemptRepositoryAdapter<R>,
    LoginLogRepositoryAdapter<R>,
>;

/// Registration, guarded login, sessions and login history over one repository provider.
///
/// # Example
///
/// ```rust,ignore
/// use gatehouse_core::{Gatehouse, LockoutConfig};
/// use gatehouse_storage_sqlite::SqliteRepositoryProvider;
/// use std::sync::Arc;
///
/// let pool = sqlx::SqlitePool::connect("sqlite::memory:").await?;
/// let repositories = Arc::new(SqliteRepositoryProvider::new(pool));
/// let gatehouse = Gatehouse::new(repositories).with_lockout_config(LockoutConfig::default());
/// gatehouse.migrate().await?;
/// ```
pub struct Gatehouse<R: RepositoryProvider> {
    repositories: Arc<R>,
    user_service: Arc<UserService<UserRepositoryAdapter<R>>>,
    session_service: Arc<SessionService<SessionRepositoryAdapter<R>>>,
    login_guard: Arc<Guard<R>>,
    login_logs: Arc<LoginLogRepositoryAdapter<R>>,
}

impl<R: RepositoryProvider> Gatehouse<R> {
    /// Create a new instance with the default lockout and session settings
    pub fn new(repositories: Arc<R>) -> Self {
        let user_repo = Arc::new(UserRepositoryAdapter::new(repositories.clone()));
        let session_repo = Arc::new(SessionRepositoryAdapter::new(repositories.clone()));
        let attempt_repo = Arc::new(LoginAttemptRepositoryAdapter::new(repositories.clone()));
        let login_logs = Arc::new(LoginLogRepositoryAdapter::new(repositories.clone()));

        Self {
            user_service: Arc::new(UserService::new(user_repo.clone())),
            session_service: Arc::new(SessionService::new(
                session_repo,
                SessionConfig::default(),
            )),
            login_guard: Arc::new(LoginGuardService::new(
                user_repo,
                attempt_repo,
                login_logs.clone(),
                LockoutConfig::default(),
            )),
            login_logs,
            repositories,
        }
    }

    pub fn with_lockout_config(mut self, config: LockoutConfig) -> Self {
        self.login_guard = Arc::new(LoginGuardService::new(
            Arc::new(UserRepositoryAdapter::new(self.repositories.clone())),
            Arc::new(LoginAttemptRepositoryAdapter::new(self.repositories.clone())),
            self.login_logs.clone(),
            config,
        ));
        self
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_service = Arc::new(SessionService::new(
            Arc::new(SessionRepositoryAdapter::new(self.repositories.clone())),
            config,
        ));
        self
    }

    pub fn lockout_config(&self) -> &LockoutConfig {
        self.login_guard.config()
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    pub async fn register(&self, input: &RegistrationInput) -> Result<User, Error> {
        self.user_service.register(input).await
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.user_service.get_user(user_id).await
    }

    /// Authenticate through the login guard and open a session.
    ///
    /// # Returns
    ///
    /// The user, the plain session token for the cookie, and the stored session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ctx: &LoginContext,
    ) -> Result<(User, SessionToken, Session), Error> {
        let user = self.login_guard.authenticate(username, password, ctx).await?;
        let (token, session) = self.session_service.create_session(&user.id, ctx).await?;
        Ok((user, token, session))
    }

    pub async fn is_blocked(&self, ip_address: &str, now: DateTime<Utc>) -> Result<BlockStatus, Error> {
        self.login_guard.is_blocked(ip_address, now).await
    }

    pub async fn attempt_record(&self, ip_address: &str) -> Result<Option<LoginAttemptRecord>, Error> {
        self.login_guard.attempt_record(ip_address).await
    }

    /// Clear the failure counter of an address. Returns whether it was blocked.
    pub async fn unblock(&self, ip_address: &str, now: DateTime<Utc>) -> Result<bool, Error> {
        self.login_guard.unblock(ip_address, now).await
    }

    /// Resolve a session token to its session and user.
    ///
    /// A session whose user no longer exists is treated as absent.
    pub async fn session_user(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<(Session, User)>, Error> {
        let Some(session) = self.session_service.get_session(token, now).await? else {
            return Ok(None);
        };

        let user = self.user_service.get_user(&session.user_id).await?;
        Ok(user.map(|user| (session, user)))
    }

    pub async fn logout(&self, token: &SessionToken) -> Result<(), Error> {
        self.session_service.delete_session(token).await
    }

    pub async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.session_service.cleanup_expired_sessions(now).await
    }

    /// Latest logins across all users, newest first
    pub async fn recent_logins(&self, limit: u32) -> Result<Vec<RecentLogin>, Error> {
        self.login_logs.recent(limit).await
    }

    /// Latest logins of one user, newest first
    pub async fn user_logins(&self, user_id: &UserId, limit: u32) -> Result<Vec<LoginLogEntry>, Error> {
        self.login_logs.for_user(user_id, limit).await
    }
}
