//! Repository implementations for SQLite storage

pub mod login_attempt;
pub mod login_log;
pub mod session;
pub mod user;

pub use login_attempt::SqliteLoginAttemptRepository;
pub use login_log::SqliteLoginLogRepository;
pub use session::SqliteSessionRepository;
pub use user::SqliteUserRepository;

use async_trait::async_trait;
use gatehouse_core::{
    Error,
    error::StorageError,
    repositories::{
        LoginAttemptRepositoryProvider, LoginLogRepositoryProvider, RepositoryProvider,
        SessionRepositoryProvider, UserRepositoryProvider,
    },
};
use gatehouse_migration::MigrationManager;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    map_sqlx_error,
    migrations::{SqliteMigrationManager, all},
};

/// Repository provider implementation for SQLite
///
/// This struct implements all the individual repository provider traits
/// as well as the unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    user: Arc<SqliteUserRepository>,
    session: Arc<SqliteSessionRepository>,
    login_attempt: Arc<SqliteLoginAttemptRepository>,
    login_log: Arc<SqliteLoginLogRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            user: Arc::new(SqliteUserRepository::new(pool.clone())),
            session: Arc::new(SqliteSessionRepository::new(pool.clone())),
            login_attempt: Arc::new(SqliteLoginAttemptRepository::new(pool.clone())),
            login_log: Arc::new(SqliteLoginLogRepository::new(pool.clone())),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Revert every applied migration, newest first. Drops all stored data.
    pub async fn rollback(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.down(&all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to roll back migrations");
            Error::Storage(StorageError::Migration(
                "Failed to roll back migrations".to_string(),
            ))
        })?;

        Ok(())
    }
}

impl UserRepositoryProvider for SqliteRepositoryProvider {
    type UserRepo = SqliteUserRepository;

    fn user(&self) -> &Self::UserRepo {
        &self.user
    }
}

impl SessionRepositoryProvider for SqliteRepositoryProvider {
    type SessionRepo = SqliteSessionRepository;

    fn session(&self) -> &Self::SessionRepo {
        &self.session
    }
}

impl LoginAttemptRepositoryProvider for SqliteRepositoryProvider {
    type LoginAttemptRepo = SqliteLoginAttemptRepository;

    fn login_attempt(&self) -> &Self::LoginAttemptRepo {
        &self.login_attempt
    }
}

impl LoginLogRepositoryProvider for SqliteRepositoryProvider {
    type LoginLogRepo = SqliteLoginLogRepository;

    fn login_log(&self) -> &Self::LoginLogRepo {
        &self.login_log
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Health check failed"))?;
        Ok(())
    }
}
