use std::{net::SocketAddr, sync::Arc};

use axum::{
    Extension, RequestPartsExt,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::{TypedHeader, extract::CookieJar, headers::UserAgent};
use gatehouse_core::{Role, SessionToken, User};

use crate::{error::WebError, types::WebConfig};

/// Address and user agent of the client making the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    pub ip: String,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientContext
where
    Arc<WebConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<WebConfig>::from_ref(state);

        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .ok()
            .flatten()
            .map(|ua| ua.to_string());

        let forwarded = config
            .trust_forwarded_for
            .then(|| forwarded_for(&parts.headers))
            .flatten();

        let ip = match forwarded {
            Some(ip) => ip,
            None => parts
                .extract::<ConnectInfo<SocketAddr>>()
                .await
                .map(|ConnectInfo(addr)| addr.ip().to_string())
                .map_err(|_| WebError::MissingClientAddress)?,
        };

        Ok(ClientContext { ip, user_agent })
    }
}

/// First entry of the `X-Forwarded-For` header.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

/// An authenticated user. Anonymous requests are redirected to the login page.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(user): Extension<User> =
            parts.extract().await.map_err(|_| WebError::Unauthenticated)?;

        Ok(CurrentUser(user))
    }
}

/// An authenticated admin. Anyone else is redirected to the login page.
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            return Err(WebError::Unauthenticated);
        }
        Ok(AdminUser(user))
    }
}

/// A user with the `user` role. Admins and anonymous visitors are redirected to the login page.
pub struct RegularUser(pub User);

impl<S> FromRequestParts<S> for RegularUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if user.role != Role::User {
            return Err(WebError::Unauthenticated);
        }
        Ok(RegularUser(user))
    }
}

pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalUser(parts.extensions.get::<User>().cloned()))
    }
}

pub struct SessionTokenFromCookie(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for SessionTokenFromCookie
where
    Arc<WebConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<WebConfig>::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let session_token = jar
            .get(&config.cookie.name)
            .map(|cookie| SessionToken::new(cookie.value()));

        Ok(SessionTokenFromCookie(session_token))
    }
}
