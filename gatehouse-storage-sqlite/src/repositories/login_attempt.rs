//! SQLite implementation of the per-address failed login counter.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gatehouse_core::{
    Error, login_attempt::LoginAttemptRecord, repositories::LoginAttemptRepository,
};
use sqlx::SqlitePool;

use crate::{from_millis, map_sqlx_error};

pub struct SqliteLoginAttemptRepository {
    pool: SqlitePool,
}

impl SqliteLoginAttemptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteLoginAttempt {
    ip_address: String,
    failed_attempts: i64,
    last_failed_attempt: i64,
    blocked_until: Option<i64>,
}

impl From<SqliteLoginAttempt> for LoginAttemptRecord {
    fn from(row: SqliteLoginAttempt) -> Self {
        LoginAttemptRecord {
            ip_address: row.ip_address,
            failed_attempts: u32::try_from(row.failed_attempts).unwrap_or(u32::MAX),
            last_failed_attempt: from_millis(row.last_failed_attempt),
            blocked_until: row.blocked_until.map(from_millis),
        }
    }
}

#[async_trait]
impl LoginAttemptRepository for SqliteLoginAttemptRepository {
    async fn find(&self, ip_address: &str) -> Result<Option<LoginAttemptRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteLoginAttempt>(
            r#"
            SELECT ip_address, failed_attempts, last_failed_attempt, blocked_until
            FROM login_attempts
            WHERE ip_address = ?1
            "#,
        )
        .bind(ip_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to load login attempts"))?;

        Ok(row.map(Into::into))
    }

    async fn record_failure(
        &self,
        ip_address: &str,
        now: DateTime<Utc>,
        threshold: u32,
        lockout_period: Duration,
    ) -> Result<LoginAttemptRecord, Error> {
        let blocked_until = (now + lockout_period).timestamp_millis();

        // One statement: the increment and the threshold check see the same row version.
        let row = sqlx::query_as::<_, SqliteLoginAttempt>(
            r#"
            INSERT INTO login_attempts (ip_address, failed_attempts, last_failed_attempt, blocked_until)
            VALUES (?1, 1, ?2, CASE WHEN 1 >= ?3 THEN ?4 ELSE NULL END)
            ON CONFLICT(ip_address) DO UPDATE SET
                failed_attempts = login_attempts.failed_attempts + 1,
                last_failed_attempt = excluded.last_failed_attempt,
                blocked_until = CASE
                    WHEN login_attempts.failed_attempts + 1 >= ?3 THEN ?4
                    ELSE login_attempts.blocked_until
                END
            RETURNING ip_address, failed_attempts, last_failed_attempt, blocked_until
            "#,
        )
        .bind(ip_address)
        .bind(now.timestamp_millis())
        .bind(i64::from(threshold))
        .bind(blocked_until)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to record failed login attempt"))?;

        Ok(row.into())
    }

    async fn clear(&self, ip_address: &str) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM login_attempts WHERE ip_address = ?1")
            .bind(ip_address)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to clear login attempts"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{setup_single_connection_db, setup_test_db};
    use std::sync::Arc;

    const IP: &str = "1.2.3.4";

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_first_failure_inserts_record() {
        let repo = SqliteLoginAttemptRepository::new(setup_test_db().await);

        assert!(repo.find(IP).await.unwrap().is_none());
        let record = repo
            .record_failure(IP, at(0), 5, Duration::minutes(15))
            .await
            .unwrap();

        assert_eq!(record.ip_address, IP);
        assert_eq!(record.failed_attempts, 1);
        assert_eq!(record.last_failed_attempt, at(0));
        assert_eq!(record.blocked_until, None);
        assert_eq!(repo.find(IP).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_block_set_when_threshold_reached() {
        let repo = SqliteLoginAttemptRepository::new(setup_test_db().await);

        for i in 0..4 {
            let record = repo
                .record_failure(IP, at(i), 5, Duration::minutes(15))
                .await
                .unwrap();
            assert_eq!(record.blocked_until, None);
        }

        let record = repo
            .record_failure(IP, at(10), 5, Duration::minutes(15))
            .await
            .unwrap();
        assert_eq!(record.failed_attempts, 5);
        assert_eq!(record.last_failed_attempt, at(10));
        assert_eq!(record.blocked_until, Some(at(10) + Duration::minutes(15)));
    }

    #[tokio::test]
    async fn test_block_keeps_sub_second_precision() {
        let repo = SqliteLoginAttemptRepository::new(setup_test_db().await);
        let now = DateTime::from_timestamp_millis(1_700_000_000_900).unwrap();

        let record = repo
            .record_failure(IP, now, 1, Duration::minutes(15))
            .await
            .unwrap();
        assert_eq!(record.last_failed_attempt, now);
        assert_eq!(record.blocked_until, Some(now + Duration::minutes(15)));

        let stored = repo.find(IP).await.unwrap().unwrap();
        assert_eq!(stored.blocked_until, Some(now + Duration::minutes(15)));
    }

    #[tokio::test]
    async fn test_failures_past_threshold_extend_block() {
        let repo = SqliteLoginAttemptRepository::new(setup_test_db().await);
        repo.record_failure(IP, at(0), 1, Duration::minutes(15)).await.unwrap();

        let later = at(20 * 60);
        let record = repo
            .record_failure(IP, later, 1, Duration::minutes(15))
            .await
            .unwrap();
        assert_eq!(record.failed_attempts, 2);
        assert_eq!(record.blocked_until, Some(later + Duration::minutes(15)));
    }

    #[tokio::test]
    async fn test_existing_block_kept_below_threshold() {
        let repo = SqliteLoginAttemptRepository::new(setup_test_db().await);
        let first = repo
            .record_failure(IP, at(0), 1, Duration::minutes(15))
            .await
            .unwrap();

        let second = repo
            .record_failure(IP, at(30), 10, Duration::minutes(15))
            .await
            .unwrap();
        assert_eq!(second.failed_attempts, 2);
        assert_eq!(second.blocked_until, first.blocked_until);
    }

    #[tokio::test]
    async fn test_clear_removes_record() {
        let repo = SqliteLoginAttemptRepository::new(setup_test_db().await);
        repo.record_failure(IP, at(0), 5, Duration::minutes(15)).await.unwrap();
        repo.record_failure("5.6.7.8", at(0), 5, Duration::minutes(15)).await.unwrap();

        assert!(repo.clear(IP).await.unwrap());
        assert!(!repo.clear(IP).await.unwrap());
        assert!(repo.find(IP).await.unwrap().is_none());
        assert!(repo.find("5.6.7.8").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_failures_are_all_counted() {
        let repo = Arc::new(SqliteLoginAttemptRepository::new(
            setup_single_connection_db().await,
        ));
        for i in 0..3 {
            repo.record_failure(IP, at(i), 100, Duration::minutes(15)).await.unwrap();
        }

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.record_failure(IP, at(10 + i), 100, Duration::minutes(15))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut counts = Vec::new();
        for handle in handles {
            counts.push(handle.await.unwrap().failed_attempts);
        }
        counts.sort_unstable();

        assert_eq!(counts, (4..=23).collect::<Vec<u32>>());
        assert_eq!(repo.find(IP).await.unwrap().unwrap().failed_attempts, 23);
    }
}
