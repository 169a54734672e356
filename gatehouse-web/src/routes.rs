use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use chrono::{DateTime, Utc};
use gatehouse_core::{
    BlockStatus, Error, LoginContext, RepositoryProvider, SessionToken,
    error::{AuthError, ValidationError},
    validation::RegistrationInput,
};
use tower_http::trace::TraceLayer;

use crate::{
    csrf,
    error::{Result, UNAVAILABLE_MESSAGE},
    extractors::{AdminUser, ClientContext, OptionalUser, RegularUser, SessionTokenFromCookie},
    middleware::{AppState, session_middleware},
    templates::{
        AdminDashboardTemplate, AttemptRow, DashboardTemplate, LoginRow, LoginTemplate,
        RecentLoginRow, RegisterTemplate, render,
    },
    types::*,
};

pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both username and password.";
pub const BLOCKED_MESSAGE: &str =
    "Your IP is temporarily blocked due to multiple failed attempts. Try again later.";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect username or password.";
pub const REGISTERED_MESSAGE: &str = "Registration successful. Please log in.";

pub fn create_router<R>(state: AppState<R>) -> Router
where
    R: RepositoryProvider + 'static,
{
    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/register", get(register_page_handler).post(register_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/admin/dashboard", get(admin_dashboard_handler))
        .route("/logout", get(logout_handler))
        .route("/health", get(health_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_middleware::<R>,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn index_handler(OptionalUser(user): OptionalUser) -> Response {
    match user {
        Some(user) => found(user.role.landing_path()),
        None => found("/login"),
    }
}

async fn health_handler<R>(State(state): State<AppState<R>>) -> Response
where
    R: RepositoryProvider,
{
    let healthy = match state.gatehouse.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            false
        }
    };

    let body = Json(HealthResponse {
        status: if healthy { "healthy" } else { "unavailable" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    if healthy {
        (StatusCode::OK, body).into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
    }
}

async fn login_page_handler<R>(
    State(state): State<AppState<R>>,
    OptionalUser(user): OptionalUser,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Result<Response>
where
    R: RepositoryProvider,
{
    if let Some(user) = user {
        return Ok(found(user.role.landing_path()));
    }

    let (jar, csrf_token) = csrf::ensure_token(jar, &state.config.cookie);
    let page = render(&LoginTemplate {
        csrf_token,
        notice: query
            .registered
            .is_some()
            .then(|| REGISTERED_MESSAGE.to_string()),
        ..Default::default()
    })?;

    Ok((jar, page).into_response())
}

async fn login_handler<R>(
    State(state): State<AppState<R>>,
    client: ClientContext,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response>
where
    R: RepositoryProvider,
{
    csrf::verify(&jar, &state.config.cookie, &form.csrf_token)?;

    let username = form.username.trim();
    let password = form.password.trim();
    let now = state.clock.now();
    let ctx = LoginContext::builder()
        .ip_address(client.ip)
        .user_agent(client.user_agent)
        .at(now)
        .build()?;

    let error = match state.gatehouse.login(username, password, &ctx).await {
        Ok((user, token, _session)) => {
            let jar = jar.add(session_cookie(&state.config.cookie, token));
            return Ok((jar, found(user.role.landing_path())).into_response());
        }
        Err(e) => e,
    };

    let Some((status, message, retry_after)) = login_failure(&error, now) else {
        return Err(error.into());
    };

    let (jar, csrf_token) = csrf::ensure_token(jar, &state.config.cookie);
    let page = render(&LoginTemplate {
        csrf_token,
        username: username.to_string(),
        error: Some(message.to_string()),
        notice: None,
    })?;

    let mut response = (status, jar, page).into_response();
    if let Some(seconds) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
    }
    Ok(response)
}

async fn register_page_handler<R>(
    State(state): State<AppState<R>>,
    OptionalUser(user): OptionalUser,
    jar: CookieJar,
) -> Result<Response>
where
    R: RepositoryProvider,
{
    if let Some(user) = user {
        return Ok(found(user.role.landing_path()));
    }

    let (jar, csrf_token) = csrf::ensure_token(jar, &state.config.cookie);
    let page = render(&RegisterTemplate {
        csrf_token,
        ..Default::default()
    })?;

    Ok((jar, page).into_response())
}

async fn register_handler<R>(
    State(state): State<AppState<R>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response>
where
    R: RepositoryProvider,
{
    csrf::verify(&jar, &state.config.cookie, &form.csrf_token)?;

    let input = RegistrationInput {
        username: form.username.trim().to_string(),
        password: form.password.trim().to_string(),
        confirm_password: form.confirm_password.trim().to_string(),
        role: form.user_type.trim().to_string(),
    };

    let (status, errors, error) = match state.gatehouse.register(&input).await {
        Ok(_) => return Ok(found("/login?registered=1")),
        Err(Error::Validation(ValidationError::Fields(errors))) => (StatusCode::OK, errors, None),
        Err(e) if e.is_storage_unavailable() => (
            StatusCode::SERVICE_UNAVAILABLE,
            Default::default(),
            Some(UNAVAILABLE_MESSAGE.to_string()),
        ),
        Err(e) => return Err(e.into()),
    };

    let (jar, csrf_token) = csrf::ensure_token(jar, &state.config.cookie);
    let page = render(&RegisterTemplate {
        csrf_token,
        username: input.username,
        role: input.role,
        errors,
        error,
    })?;

    Ok((status, jar, page).into_response())
}

async fn dashboard_handler<R>(
    State(state): State<AppState<R>>,
    RegularUser(user): RegularUser,
    client: ClientContext,
) -> Result<Response>
where
    R: RepositoryProvider,
{
    let now = state.clock.now();
    let history = state
        .gatehouse
        .user_logins(&user.id, state.config.history_limit)
        .await?;
    let attempt = state.gatehouse.attempt_record(&client.ip).await?;

    let page = render(&DashboardTemplate {
        username: user.username,
        client_ip: client.ip,
        history: history.iter().map(LoginRow::from).collect(),
        attempt: attempt.map(|record| AttemptRow::new(&record, now)),
    })?;

    Ok(page.into_response())
}

async fn admin_dashboard_handler<R>(
    State(state): State<AppState<R>>,
    AdminUser(user): AdminUser,
    client: ClientContext,
) -> Result<Response>
where
    R: RepositoryProvider,
{
    let now = state.clock.now();
    let recent = state
        .gatehouse
        .recent_logins(state.config.recent_logins_limit)
        .await?;
    let attempt = state.gatehouse.attempt_record(&client.ip).await?;

    let page = render(&AdminDashboardTemplate {
        username: user.username,
        client_ip: client.ip,
        recent_logins: recent.iter().map(RecentLoginRow::from).collect(),
        attempt: attempt.map(|record| AttemptRow::new(&record, now)),
    })?;

    Ok(page.into_response())
}

async fn logout_handler<R>(
    State(state): State<AppState<R>>,
    jar: CookieJar,
    SessionTokenFromCookie(session_token): SessionTokenFromCookie,
) -> Response
where
    R: RepositoryProvider,
{
    if let Some(session_token) = session_token {
        if let Err(e) = state.gatehouse.logout(&session_token).await {
            tracing::error!(error = %e, "Failed to delete session on logout");
        }
    }

    let removal = Cookie::build((state.config.cookie.name.clone(), ""))
        .path(state.config.cookie.path.clone());
    (jar.remove(removal), found("/login")).into_response()
}

/// Status, inline message and `Retry-After` seconds for a failed login.
/// `None` for errors that are not a login outcome.
fn login_failure(
    error: &Error,
    now: DateTime<Utc>,
) -> Option<(StatusCode, &'static str, Option<i64>)> {
    if let Some(until) = error.blocked_until() {
        return Some((
            StatusCode::TOO_MANY_REQUESTS,
            BLOCKED_MESSAGE,
            BlockStatus::Blocked { until }.retry_after_seconds(now),
        ));
    }

    match error {
        Error::Validation(_) => Some((StatusCode::OK, MISSING_CREDENTIALS_MESSAGE, None)),
        Error::Auth(AuthError::InvalidCredentials) => {
            Some((StatusCode::OK, INVALID_CREDENTIALS_MESSAGE, None))
        }
        e if e.is_storage_unavailable() => {
            Some((StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE, None))
        }
        _ => None,
    }
}

fn session_cookie(config: &CookieConfig, token: SessionToken) -> Cookie<'static> {
    Cookie::build((config.name.clone(), token.into_inner()))
        .path(config.path.clone())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(config.same_site.into())
        .build()
}
