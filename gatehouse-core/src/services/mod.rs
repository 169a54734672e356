//! Service layer for business logic
//!
//! This module contains concrete service implementations that encapsulate
//! authentication, lockout and user management logic.

pub mod login_guard;
pub mod session;
pub mod user;

pub use login_guard::LoginGuardService;
pub use session::SessionService;
pub use user::UserService;
