//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which authentication backend signs users in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// In-memory accounts, reset codes shown on screen.
    Demo,
    /// Accounts and sessions in Postgres, passwords hashed with argon2.
    Production,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "demo" => Ok(Self::Demo),
            "production" => Ok(Self::Production),
            other => Err(format!("'{}' is not one of demo, production", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub auth_mode: AuthMode,
    pub demo_latency: Duration,
    pub profile_setup_after_register: bool,
    pub session_ttl: chrono::Duration,
    pub cors_origin: String,
    /// Unfinished flows untouched for this long are dropped.
    pub flow_idle_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Load Server and Database Settings ---
        let bind_address = parse("BIND_ADDRESS", &var("BIND_ADDRESS", "0.0.0.0:3000"))?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Onboarding Settings ---
        let auth_mode = var("AUTH_MODE", "demo")
            .parse::<AuthMode>()
            .map_err(|e| ConfigError::InvalidValue("AUTH_MODE".to_string(), e))?;
        let demo_latency =
            Duration::from_millis(parse("DEMO_LATENCY_MS", &var("DEMO_LATENCY_MS", "1500"))?);
        let profile_setup_after_register = parse(
            "PROFILE_SETUP_AFTER_REGISTER",
            &var("PROFILE_SETUP_AFTER_REGISTER", "false"),
        )?;

        let ttl_days: i64 = parse("SESSION_TTL_DAYS", &var("SESSION_TTL_DAYS", "30"))?;
        if ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let session_ttl = chrono::Duration::days(ttl_days);

        let cors_origin = var("CORS_ORIGIN", "http://localhost:8081");

        let idle_minutes: u64 = parse("FLOW_IDLE_MINUTES", &var("FLOW_IDLE_MINUTES", "30"))?;
        if idle_minutes == 0 {
            return Err(ConfigError::InvalidValue(
                "FLOW_IDLE_MINUTES".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let flow_idle_timeout = Duration::from_secs(idle_minutes * 60);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            auth_mode,
            demo_latency,
            profile_setup_after_register,
            session_ttl,
            cors_origin,
            flow_idle_timeout,
        })
    }
}

fn parse<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
