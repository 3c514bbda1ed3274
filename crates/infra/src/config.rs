//! Environment-driven configuration.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },
}

/// Process configuration, read once at startup.
///
/// `database_url = None` selects the in-memory stores (dev/test mode).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Shared secret for the cron/internal routes.
    pub cron_secret: String,
    /// Absolute URL of the reminder delivery endpoint the run dispatches to.
    pub delivery_url: String,
    pub dispatch_concurrency: usize,
    pub dispatch_lease_secs: i64,
    pub delivery_timeout: Duration,
    pub email_api_base: Option<String>,
    pub email_api_key: String,
    pub email_from: String,
    pub billing_api_base: Option<String>,
    pub billing_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:8080");
        let delivery_url = match std::env::var("DELIVERY_URL") {
            Ok(url) => url,
            // The run dispatches back into this process by default.
            Err(_) => {
                let port = bind_addr.rsplit(':').next().unwrap_or("8080");
                format!("http://127.0.0.1:{port}/internal/reminders/deliver")
            }
        };

        Ok(Self {
            bind_addr,
            database_url: std::env::var("DATABASE_URL").ok(),
            jwt_secret: require("JWT_SECRET")?,
            cron_secret: require("CRON_SECRET")?,
            delivery_url,
            dispatch_concurrency: parse_or("DISPATCH_CONCURRENCY", 8)?,
            dispatch_lease_secs: parse_or("DISPATCH_LEASE_SECS", 300)?,
            delivery_timeout: Duration::from_secs(parse_or("DELIVERY_TIMEOUT_SECS", 10)?),
            email_api_base: std::env::var("EMAIL_API_BASE").ok(),
            email_api_key: env_or("EMAIL_API_KEY", ""),
            email_from: env_or("EMAIL_FROM", "no-reply@donorhub.local"),
            billing_api_base: std::env::var("BILLING_API_BASE").ok(),
            billing_api_key: env_or("BILLING_API_KEY", ""),
        })
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

fn require(var: &'static str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingVar(var))
}

fn parse_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            var,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
