use async_trait::async_trait;
use gatehouse_core::{
    Error, User, UserId,
    error::StorageError,
    repositories::UserRepository,
    user::{NewUser, Role, UserCredentials},
};
use sqlx::SqlitePool;

use crate::{from_millis, map_sqlx_error};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteUser {
    id: i64,
    username: String,
    password_hash: String,
    user_type: String,
    created_at: i64,
}

impl TryFrom<SqliteUser> for UserCredentials {
    type Error = StorageError;

    fn try_from(row: SqliteUser) -> Result<Self, Self::Error> {
        let role = row.user_type.parse::<Role>().map_err(|e| {
            tracing::error!(user_id = row.id, error = %e, "Stored user has an unknown role");
            StorageError::Database(format!("Unknown role for user {}", row.id))
        })?;

        Ok(UserCredentials {
            user: User {
                id: UserId::new(row.id),
                username: row.username,
                role,
                created_at: from_millis(row.created_at),
            },
            password_hash: row.password_hash,
        })
    }
}

const SELECT_USER: &str = "SELECT id, username, password_hash, user_type, created_at FROM users";

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let now = chrono::Utc::now().timestamp_millis();

        let row = sqlx::query_as::<_, SqliteUser>(
            r#"
            INSERT INTO users (username, password_hash, user_type, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, username, password_hash, user_type, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to create user"))?;

        Ok(UserCredentials::try_from(row)?.user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(&format!("{SELECT_USER} WHERE id = ?1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to find user"))?;

        row.map(|r| UserCredentials::try_from(r).map(|c| c.user))
            .transpose()
            .map_err(Error::from)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        Ok(self.find_credentials(username).await?.map(|c| c.user))
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, Error> {
        let row = sqlx::query_as::<_, SqliteUser>(&format!("{SELECT_USER} WHERE username = ?1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to find user"))?;

        row.map(UserCredentials::try_from)
            .transpose()
            .map_err(Error::from)
    }
}
