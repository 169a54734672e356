use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{routes::found, templates::ErrorTemplate};

pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable. Please try again later.";
const INTERNAL_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Error)]
pub enum WebError {
    /// No session, or a session of the wrong role; the browser is sent to the login page.
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid or missing CSRF token")]
    CsrfMismatch,

    #[error("Client address could not be determined")]
    MissingClientAddress,

    #[error(transparent)]
    Core(#[from] gatehouse_core::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Unauthenticated => StatusCode::FOUND,
            WebError::CsrfMismatch => StatusCode::FORBIDDEN,
            WebError::MissingClientAddress => StatusCode::BAD_REQUEST,
            WebError::Core(e) if e.is_storage_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
            WebError::Core(_) | WebError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            WebError::Unauthenticated => "Please log in.",
            WebError::CsrfMismatch => "Invalid or expired form. Please reload the page and try again.",
            WebError::MissingClientAddress => "Could not determine your network address.",
            WebError::Core(e) if e.is_storage_unavailable() => UNAVAILABLE_MESSAGE,
            WebError::Core(_) | WebError::Template(_) => INTERNAL_MESSAGE,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if matches!(self, WebError::Unauthenticated) {
            return found("/login");
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let page = ErrorTemplate {
            status: status.as_u16(),
            message: self.public_message(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(_) => (status, self.public_message()).into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
