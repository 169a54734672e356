use crate::{
    Error, Session, UserId,
    context::LoginContext,
    repositories::SessionRepository,
    session::{SessionConfig, SessionToken},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Service for session management operations
pub struct SessionService<R: SessionRepository> {
    repository: Arc<R>,
    config: SessionConfig,
}

impl<R: SessionRepository> SessionService<R> {
    /// Create a new SessionService with the given repository
    pub fn new(repository: Arc<R>, config: SessionConfig) -> Self {
        Self { repository, config }
    }

    /// Create a new session for a user.
    ///
    /// The plain token is only returned here; storage sees its hash.
    pub async fn create_session(
        &self,
        user_id: &UserId,
        ctx: &LoginContext,
    ) -> Result<(SessionToken, Session), Error> {
        let token = SessionToken::new_random();
        let session = Session {
            token_hash: token.hash(),
            user_id: *user_id,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            created_at: ctx.at,
            expires_at: ctx.at + self.config.expires_in,
        };

        let session = self.repository.create(session).await?;
        Ok((token, session))
    }

    /// Get a live session by token. Expired sessions are deleted and reported as absent.
    pub async fn get_session(
        &self,
        token: &SessionToken,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, Error> {
        let token_hash = token.hash();
        let Some(session) = self.repository.find_by_token_hash(&token_hash).await? else {
            return Ok(None);
        };

        if session.is_expired_at(now) {
            tracing::debug!(user_id = %session.user_id, "Dropping expired session");
            self.repository.delete(&token_hash).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete a session
    pub async fn delete_session(&self, token: &SessionToken) -> Result<(), Error> {
        self.repository.delete(&token.hash()).await
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.repository.delete_expired(now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockSessionRepository {
        sessions: Mutex<HashMap<String, Session>>,
    }

    #[async_trait]
    impl SessionRepository for MockSessionRepository {
        async fn create(&self, session: Session) -> Result<Session, Error> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.token_hash.clone(), session.clone());
            Ok(session)
        }

        async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, Error> {
            Ok(self.sessions.lock().unwrap().get(token_hash).cloned())
        }

        async fn delete(&self, token_hash: &str) -> Result<(), Error> {
            self.sessions.lock().unwrap().remove(token_hash);
            Ok(())
        }

        async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|_, s| !s.is_expired_at(now));
            Ok((before - sessions.len()) as u64)
        }
    }

    fn service() -> (SessionService<MockSessionRepository>, Arc<MockSessionRepository>) {
        let repo = Arc::new(MockSessionRepository::default());
        (SessionService::new(repo.clone(), SessionConfig::default()), repo)
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (service, repo) = service();
        let now = Utc::now();
        let ctx = LoginContext::new("10.0.0.1", now);

        let (token, session) = service.create_session(&UserId::new(7), &ctx).await.unwrap();
        assert_eq!(session.expires_at, now + Duration::hours(24));
        assert!(!repo.sessions.lock().unwrap().contains_key(token.as_str()));

        let found = service.get_session(&token, now).await.unwrap().unwrap();
        assert_eq!(found.user_id, UserId::new(7));
        assert_eq!(found.ip_address, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_expired_session_is_deleted_on_lookup() {
        let (service, repo) = service();
        let now = Utc::now();
        let (token, _) = service
            .create_session(&UserId::new(1), &LoginContext::new("10.0.0.1", now))
            .await
            .unwrap();

        let later = now + Duration::hours(25);
        assert!(service.get_session(&token, later).await.unwrap().is_none());
        assert!(repo.sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_deleted_tokens() {
        let (service, _) = service();
        let now = Utc::now();
        assert!(
            service
                .get_session(&SessionToken::new_random(), now)
                .await
                .unwrap()
                .is_none()
        );

        let (token, _) = service
            .create_session(&UserId::new(1), &LoginContext::new("10.0.0.1", now))
            .await
            .unwrap();
        service.delete_session(&token).await.unwrap();
        assert!(service.get_session(&token, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let (service, _) = service();
        let now = Utc::now();
        service
            .create_session(&UserId::new(1), &LoginContext::new("10.0.0.1", now))
            .await
            .unwrap();

        assert_eq!(service.cleanup_expired_sessions(now).await.unwrap(), 0);
        assert_eq!(
            service
                .cleanup_expired_sessions(now + Duration::days(2))
                .await
                .unwrap(),
            1
        );
    }
}
