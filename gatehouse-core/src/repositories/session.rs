use crate::{Error, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository for session data access. Sessions are keyed by the hash of their token.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Create a new session
    async fn create(&self, session: Session) -> Result<Session, Error>;

    /// Find a session by token hash
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, Error>;

    /// Delete a session by token hash
    async fn delete(&self, token_hash: &str) -> Result<(), Error>;

    /// Delete every session that expired at or before `now`, returning how many went
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;
}
