use async_trait::async_trait;

use crate::{
    Error, UserId,
    login_log::{LoginLogEntry, NewLoginLogEntry, RecentLogin},
};

/// Repository for the append-only login history
#[async_trait]
pub trait LoginLogRepository: Send + Sync + 'static {
    /// Append one successful login
    async fn append(&self, entry: NewLoginLogEntry) -> Result<LoginLogEntry, Error>;

    /// Latest logins across all users, newest first
    async fn recent(&self, limit: u32) -> Result<Vec<RecentLogin>, Error>;

    /// Latest logins of one user, newest first
    async fn for_user(&self, user_id: &UserId, limit: u32) -> Result<Vec<LoginLogEntry>, Error>;
}
