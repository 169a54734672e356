//! Repository traits for data access layer
//!
//! This module defines the repository interfaces that services use to interact with storage.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each table
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus lifecycle methods

pub mod adapter;
pub mod login_attempt;
pub mod login_log;
pub mod session;
pub mod user;

pub use adapter::{
    LoginAttemptRepositoryAdapter, LoginLogRepositoryAdapter, SessionRepositoryAdapter,
    UserRepositoryAdapter,
};
pub use login_attempt::LoginAttemptRepository;
pub use login_log::LoginLogRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for user repository access.
pub trait UserRepositoryProvider: Send + Sync + 'static {
    type UserRepo: UserRepository;

    fn user(&self) -> &Self::UserRepo;
}

/// Provider trait for session repository access.
pub trait SessionRepositoryProvider: Send + Sync + 'static {
    type SessionRepo: SessionRepository;

    fn session(&self) -> &Self::SessionRepo;
}

/// Provider trait for failed login counter access.
pub trait LoginAttemptRepositoryProvider: Send + Sync + 'static {
    type LoginAttemptRepo: LoginAttemptRepository;

    fn login_attempt(&self) -> &Self::LoginAttemptRepo;
}

/// Provider trait for login history access.
pub trait LoginLogRepositoryProvider: Send + Sync + 'static {
    type LoginLogRepo: LoginLogRepository;

    fn login_log(&self) -> &Self::LoginLogRepo;
}

/// Provider trait that storage implementations must implement to provide all repositories.
///
/// # Example
///
/// ```rust,ignore
/// use gatehouse_core::repositories::*;
///
/// struct MyStorage { /* ... */ }
///
/// impl UserRepositoryProvider for MyStorage {
///     type UserRepo = MyUserRepository;
///     fn user(&self) -> &Self::UserRepo { &self.user_repo }
/// }
///
/// // ... implement other provider traits ...
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    UserRepositoryProvider
    + SessionRepositoryProvider
    + LoginAttemptRepositoryProvider
    + LoginLogRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
