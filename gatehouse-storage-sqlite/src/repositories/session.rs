use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_core::{Error, Session, UserId, repositories::SessionRepository};
use sqlx::SqlitePool;

use crate::{from_millis, map_sqlx_error};

pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteSession {
    token_hash: String,
    user_id: i64,
    ip_address: String,
    user_agent: Option<String>,
    created_at: i64,
    expires_at: i64,
}

impl From<SqliteSession> for Session {
    fn from(row: SqliteSession) -> Self {
        Session {
            token_hash: row.token_hash,
            user_id: UserId::new(row.user_id),
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: from_millis(row.created_at),
            expires_at: from_millis(row.expires_at),
        }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, Error> {
        let row = sqlx::query_as::<_, SqliteSession>(
            r#"
            INSERT INTO sessions (token_hash, user_id, ip_address, user_agent, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING token_hash, user_id, ip_address, user_agent, created_at, expires_at
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.user_id.as_i64())
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.created_at.timestamp_millis())
        .bind(session.expires_at.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create session"))?;

        Ok(row.into())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, Error> {
        let row = sqlx::query_as::<_, SqliteSession>(
            r#"
            SELECT token_hash, user_id, ip_address, user_agent, created_at, expires_at
            FROM sessions
            WHERE token_hash = ?1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to find session"))?;

        Ok(row.map(Into::into))
    }

    async fn delete(&self, token_hash: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?1")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to delete session"))?;

        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to clean up expired sessions"))?;

        Ok(result.rows_affected())
    }
}
