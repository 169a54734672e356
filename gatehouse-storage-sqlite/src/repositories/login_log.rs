use async_trait::async_trait;
use gatehouse_core::{
    Error, UserId,
    error::StorageError,
    login_log::{LoginLogEntry, NewLoginLogEntry, RecentLogin},
    repositories::LoginLogRepository,
    user::Role,
};
use sqlx::SqlitePool;

use crate::{from_millis, map_sqlx_error};

pub struct SqliteLoginLogRepository {
    pool: SqlitePool,
}

impl SqliteLoginLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteLoginLog {
    id: i64,
    user_id: i64,
    ip_address: String,
    login_time: i64,
}

impl From<SqliteLoginLog> for LoginLogEntry {
    fn from(row: SqliteLoginLog) -> Self {
        LoginLogEntry {
            id: row.id,
            user_id: UserId::new(row.user_id),
            ip_address: row.ip_address,
            login_time: from_millis(row.login_time),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteRecentLogin {
    username: String,
    user_type: String,
    ip_address: String,
    login_time: i64,
}

impl TryFrom<SqliteRecentLogin> for RecentLogin {
    type Error = StorageError;

    fn try_from(row: SqliteRecentLogin) -> Result<Self, Self::Error> {
        let role = row.user_type.parse::<Role>().map_err(|e| {
            tracing::error!(username = %row.username, error = %e, "Stored user has an unknown role");
            StorageError::Database(format!("Unknown role for user {}", row.username))
        })?;

        Ok(RecentLogin {
            username: row.username,
            role,
            ip_address: row.ip_address,
            login_time: from_millis(row.login_time),
        })
    }
}

#[async_trait]
impl LoginLogRepository for SqliteLoginLogRepository {
    async fn append(&self, entry: NewLoginLogEntry) -> Result<LoginLogEntry, Error> {
        let row = sqlx::query_as::<_, SqliteLoginLog>(
            r#"
            INSERT INTO login_logs (user_id, ip_address, login_time)
            VALUES (?1, ?2, ?3)
            RETURNING id, user_id, ip_address, login_time
            "#,
        )
        .bind(entry.user_id.as_i64())
        .bind(&entry.ip_address)
        .bind(entry.login_time.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to append login log entry"))?;

        Ok(row.into())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<RecentLogin>, Error> {
        let rows = sqlx::query_as::<_, SqliteRecentLogin>(
            r#"
            SELECT u.username, u.user_type, l.ip_address, l.login_time
            FROM login_logs l
            JOIN users u ON u.id = l.user_id
            ORDER BY l.login_time DESC, l.id DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to load recent logins"))?;

        rows.into_iter()
            .map(|r| RecentLogin::try_from(r).map_err(Error::from))
            .collect()
    }

    async fn for_user(&self, user_id: &UserId, limit: u32) -> Result<Vec<LoginLogEntry>, Error> {
        let rows = sqlx::query_as::<_, SqliteLoginLog>(
            r#"
            SELECT id, user_id, ip_address, login_time
            FROM login_logs
            WHERE user_id = ?1
            ORDER BY login_time DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(user_id.as_i64())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to load login history"))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
