//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use tracing::Level;

/// Accepted values for `SESSION_MAX_AGE_DAYS`.
pub const SESSION_MAX_AGE_DAYS: RangeInclusive<i64> = 1..=3650;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    /// Externally reachable origin, used to build the OAuth redirect URI.
    pub public_url: String,
    pub cors_origin: Option<String>,
    pub auth_secret: String,
    pub session_max_age_days: i64,
    pub google_client_id: String,
    pub google_client_secret: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;
        let database_max_connections = parsed("DATABASE_MAX_CONNECTIONS", 5)?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let public_url = std::env::var("PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let cors_origin = std::env::var("CORS_ORIGIN").ok();

        // --- Load Session and Identity Provider Settings ---
        let auth_secret = required("AUTH_SECRET")?;
        if auth_secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "AUTH_SECRET".to_string(),
                "must be at least 32 characters".to_string(),
            ));
        }
        let session_max_age_days = in_range(
            "SESSION_MAX_AGE_DAYS",
            parsed("SESSION_MAX_AGE_DAYS", 30)?,
            SESSION_MAX_AGE_DAYS,
        )?;
        let google_client_id = required("GOOGLE_CLIENT_ID")?;
        let google_client_secret = required("GOOGLE_CLIENT_SECRET")?;

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            public_url,
            cors_origin,
            auth_secret,
            session_max_age_days,
            google_client_id,
            google_client_secret,
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn in_range(name: &str, value: i64, range: RangeInclusive<i64>) -> Result<i64, ConfigError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{} is outside {}..={}", value, range.start(), range.end()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_max_age_must_be_within_bounds() {
        assert_eq!(in_range("SESSION_MAX_AGE_DAYS", 30, SESSION_MAX_AGE_DAYS).unwrap(), 30);
        assert_eq!(in_range("SESSION_MAX_AGE_DAYS", 1, SESSION_MAX_AGE_DAYS).unwrap(), 1);
        assert_eq!(in_range("SESSION_MAX_AGE_DAYS", 3650, SESSION_MAX_AGE_DAYS).unwrap(), 3650);

        for bad in [0, -5, 3651, 100_000_000, i64::MAX] {
            let err = in_range("SESSION_MAX_AGE_DAYS", bad, SESSION_MAX_AGE_DAYS).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue(name, _) if name == "SESSION_MAX_AGE_DAYS"),
                "{} accepted",
                bad
            );
        }
    }
}
