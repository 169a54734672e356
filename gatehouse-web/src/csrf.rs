//! Double-submit CSRF tokens for the HTML forms.
//!
//! Rendering a form makes sure the browser holds a random token in a cookie and embeds the
//! same value in a hidden field. A form post is accepted only when both copies match.
use axum_extra::extract::{CookieJar, cookie::Cookie};
use gatehouse_core::crypto::{constant_time_compare, generate_secure_token};

use crate::{error::WebError, types::CookieConfig};

/// Reuse the token already in the cookie jar, or mint a new one and add it.
pub fn ensure_token(jar: CookieJar, config: &CookieConfig) -> (CookieJar, String) {
    if let Some(existing) = jar.get(&config.csrf_name) {
        if !existing.value().is_empty() {
            let token = existing.value().to_string();
            return (jar, token);
        }
    }

    let token = generate_secure_token();
    let cookie = Cookie::build((config.csrf_name.clone(), token.clone()))
        .path(config.path.clone())
        .http_only(true)
        .secure(config.secure)
        .same_site(config.same_site.into());

    (jar.add(cookie), token)
}

/// Check a submitted form token against the cookie copy.
pub fn verify(jar: &CookieJar, config: &CookieConfig, submitted: &str) -> Result<(), WebError> {
    let expected = jar
        .get(&config.csrf_name)
        .map(|cookie| cookie.value())
        .filter(|value| !value.is_empty())
        .ok_or(WebError::CsrfMismatch)?;

    if submitted.is_empty() || !constant_time_compare(expected.as_bytes(), submitted.as_bytes()) {
        return Err(WebError::CsrfMismatch);
    }

    Ok(())
}
