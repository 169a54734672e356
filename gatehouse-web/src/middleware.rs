use std::sync::Arc;

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use gatehouse_core::{Clock, Gatehouse, RepositoryProvider, SessionToken, SystemClock, User};

use crate::{error::WebError, types::WebConfig};

pub struct AppState<R: RepositoryProvider> {
    pub gatehouse: Arc<Gatehouse<R>>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<WebConfig>,
}

impl<R: RepositoryProvider> AppState<R> {
    /// State on the wall clock.
    pub fn new(gatehouse: Arc<Gatehouse<R>>, config: WebConfig) -> Self {
        Self {
            gatehouse,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<R: RepositoryProvider> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            gatehouse: self.gatehouse.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R: RepositoryProvider> FromRef<AppState<R>> for Arc<WebConfig> {
    fn from_ref(state: &AppState<R>) -> Self {
        state.config.clone()
    }
}

/// Resolve the session cookie into the current [`User`].
///
/// Always inserts an `Option<User>` extension. A `User` extension is inserted only when
/// the cookie maps to a live session. A failed lookup answers with the error page instead of
/// treating the request as anonymous.
pub async fn session_middleware<R>(
    State(state): State<AppState<R>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response
where
    R: RepositoryProvider,
{
    request.extensions_mut().insert(None::<User>);

    let session_token = jar
        .get(&state.config.cookie.name)
        .map(|cookie| SessionToken::new(cookie.value()));

    if let Some(session_token) = session_token {
        match state
            .gatehouse
            .session_user(&session_token, state.clock.now())
            .await
        {
            Ok(Some((_, user))) => {
                request.extensions_mut().insert(user.clone());
                request.extensions_mut().insert(Some(user));
            }
            Ok(None) => {
                tracing::debug!("Session cookie does not match a live session");
            }
            Err(e) => return WebError::from(e).into_response(),
        }
    }

    next.run(request).await
}
