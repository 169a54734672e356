//! Core functionality for the gatehouse login application
//!
//! This crate holds the domain types, the repository traits that storage backends
//! implement, and the services built on them:
//!
//! - [`services::LoginGuardService`] mediates every login attempt against a per-IP
//!   failure counter and blocks addresses that cross the configured threshold
//! - [`services::UserService`] registers accounts
//! - [`services::SessionService`] issues and resolves opaque session tokens
//!
//! [`Gatehouse`] wires all of them to a single [`RepositoryProvider`].
pub mod context;
pub mod crypto;
pub mod error;
pub mod gatehouse;
pub mod login_attempt;
pub mod login_log;
pub mod repositories;
pub mod services;
pub mod session;
pub mod user;
pub mod validation;

pub use context::{Clock, LoginContext, ManualClock, SystemClock};
pub use error::Error;
pub use gatehouse::Gatehouse;
pub use login_attempt::{BlockStatus, LockoutConfig, LoginAttemptRecord};
pub use login_log::{LoginLogEntry, NewLoginLogEntry, RecentLogin};
pub use repositories::RepositoryProvider;
pub use session::{Session, SessionConfig, SessionToken};
pub use user::{NewUser, Role, User, UserCredentials, UserId};
