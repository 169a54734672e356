//! Request-scoped inputs for authentication.
//!
//! Handlers resolve the client address and the current time once per request and pass
//! them down explicitly in a [`LoginContext`]. Services never read the wall clock or the
//! connection themselves, which keeps the lockout arithmetic deterministic under test.
use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Duration, Utc};

use crate::{Error, error::utilities::RequiredFieldExt};

/// Source of the current time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.millis.store(to.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Who is attempting to authenticate, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginContext {
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub at: DateTime<Utc>,
}

impl LoginContext {
    pub fn new(ip_address: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: None,
            at,
        }
    }

    pub fn builder() -> LoginContextBuilder {
        LoginContextBuilder::default()
    }
}

#[derive(Default)]
pub struct LoginContextBuilder {
    ip_address: Option<String>,
    user_agent: Option<String>,
    at: Option<DateTime<Utc>>,
}

impl LoginContextBuilder {
    pub fn ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = Some(at);
        self
    }

    pub fn build(self) -> Result<LoginContext, Error> {
        Ok(LoginContext {
            ip_address: self.ip_address.require_field("Client address")?,
            user_agent: self.user_agent,
            at: self.at.require_field("Request time")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_shared_time() {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        clock.advance(Duration::minutes(16));
        assert_eq!(other.now(), start + Duration::minutes(16));

        other.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn test_context_builder_requires_address_and_time() {
        let err = LoginContext::builder().at(Utc::now()).build().unwrap_err();
        assert!(err.is_validation_error());

        let ctx = LoginContext::builder()
            .ip_address("1.2.3.4")
            .user_agent(Some("curl/8".to_string()))
            .at(Utc::now())
            .build()
            .unwrap();
        assert_eq!(ctx.ip_address, "1.2.3.4");
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8"));
    }
}
