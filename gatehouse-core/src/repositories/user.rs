use crate::{Error, User, UserId, user::{NewUser, UserCredentials}};
use async_trait::async_trait;

/// Repository for user data access
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Create a new user
    ///
    /// Fails with `StorageError::Constraint` when the username is already registered.
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Find a user by ID
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// Find a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error>;

    /// Load a user together with the stored password hash
    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, Error>;
}
