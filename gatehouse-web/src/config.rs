use std::{net::SocketAddr, time::Duration};

use clap::{Parser, Subcommand};
use gatehouse_core::{LockoutConfig, SessionConfig};

use crate::types::{CookieConfig, WebConfig};

/// Login server with per-address brute force protection
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database connection string
    #[arg(long, env = "GATEHOUSE_DATABASE_URL", default_value = "sqlite://gatehouse.db")]
    pub database_url: String,

    /// Address to listen on
    #[arg(long, env = "GATEHOUSE_BIND", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Failed logins from one address before it is blocked
    #[arg(long, env = "GATEHOUSE_MAX_FAILED_ATTEMPTS", default_value_t = 5)]
    pub max_failed_attempts: u32,

    /// How long a blocked address stays blocked
    #[arg(long, env = "GATEHOUSE_LOCKOUT_MINUTES", default_value_t = 15)]
    pub lockout_minutes: i64,

    /// Turn off brute force protection entirely
    #[arg(long)]
    pub disable_lockout: bool,

    /// Session lifetime
    #[arg(long, env = "GATEHOUSE_SESSION_HOURS", default_value_t = 24)]
    pub session_hours: i64,

    /// Mark cookies `Secure` (requires HTTPS)
    #[arg(long, env = "GATEHOUSE_SECURE_COOKIES")]
    pub secure_cookies: bool,

    /// Take the client address from `X-Forwarded-For` (only behind a trusted proxy)
    #[arg(long, env = "GATEHOUSE_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,

    /// Default log filter when `RUST_LOG` is unset
    #[arg(long, env = "GATEHOUSE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Seconds to wait for a database connection
    #[arg(long, env = "GATEHOUSE_DB_TIMEOUT_SECS", default_value_t = 5)]
    pub db_timeout_secs: u64,

    /// Command to execute, `serve` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run migrations and start the HTTP server
    Serve,
    /// Run database migrations
    Migrate,
    /// Revert every migration, dropping all tables and their data
    Rollback,
    /// Clear the failed login counter of an address
    Unblock { ip: String },
    /// Print version information
    Version,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }

    pub fn lockout_config(&self) -> LockoutConfig {
        if self.disable_lockout {
            return LockoutConfig::disabled();
        }
        LockoutConfig::new(
            self.max_failed_attempts,
            chrono::Duration::minutes(self.lockout_minutes),
        )
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            expires_in: chrono::Duration::hours(self.session_hours),
        }
    }

    pub fn web_config(&self) -> WebConfig {
        let cookie = if self.secure_cookies {
            CookieConfig::default()
        } else {
            CookieConfig::development()
        };

        WebConfig {
            cookie,
            trust_forwarded_for: self.trust_forwarded_for,
            ..WebConfig::default()
        }
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_secs)
    }
}
