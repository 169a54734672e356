//! Versioned schema migrations
//!
//! Each backend implements [`MigrationManager`] over its own connection type and records
//! applied versions in a tracking table. Migrations are applied in ascending
//! [`Migration::version`] order, each one at most once.
use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::Database;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Duplicate migration version {0}")]
    DuplicateVersion(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[async_trait]
pub trait Migration<DB: Database>: Send + Sync {
    /// Execute the migration
    async fn up<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Rollback the migration
    async fn down<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64, // unix seconds
}

#[async_trait]
pub trait MigrationManager<DB: Database>: Send + Sync {
    fn get_migration_table_name(&self) -> &str {
        "_gatehouse_migrations"
    }

    /// Initialize migration tracking table
    async fn initialize(&self) -> Result<()>;

    /// Apply pending migrations
    async fn up(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Rollback applied migrations, newest first
    async fn down(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Get list of applied migrations
    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>>;

    /// Check if specific migration was applied
    async fn is_applied(&self, version: i64) -> Result<bool>;
}

/// Migrations not yet recorded in `applied`, in ascending version order.
///
/// Fails if two migrations share a version.
pub fn pending<'m, DB: Database>(
    migrations: &'m [Box<dyn Migration<DB>>],
    applied: &[MigrationRecord],
) -> Result<Vec<&'m dyn Migration<DB>>> {
    let mut seen = HashSet::new();
    for migration in migrations {
        if !seen.insert(migration.version()) {
            return Err(MigrationError::DuplicateVersion(migration.version()));
        }
    }

    let applied: HashSet<i64> = applied.iter().map(|r| r.version).collect();
    let mut pending: Vec<&dyn Migration<DB>> = migrations
        .iter()
        .map(|m| m.as_ref())
        .filter(|m| !applied.contains(&m.version()))
        .collect();
    pending.sort_by_key(|m| m.version());

    if !pending.is_empty() {
        tracing::debug!(count = pending.len(), "Found pending migrations");
    }

    Ok(pending)
}
