// src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::AppError;

/// Default exam length when an exam is created without an explicit duration.
pub const DEFAULT_EXAM_DURATION_SECONDS: u32 = 600;

/// Period of the session countdown.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub server_address: String,
    pub exam_duration_seconds: u32,
    pub tick_interval_ms: u64,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET must be set".to_string()))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://thpt.db?mode=rwc".to_string()),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", env::var("JWT_EXPIRATION").ok(), 86_400)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            server_address: env::var("SERVER_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            exam_duration_seconds: non_zero(
                "EXAM_DURATION_SECONDS",
                parse_var(
                    "EXAM_DURATION_SECONDS",
                    env::var("EXAM_DURATION_SECONDS").ok(),
                    DEFAULT_EXAM_DURATION_SECONDS,
                )?,
            )?,
            tick_interval_ms: parse_var(
                "TICK_INTERVAL_MS",
                env::var("TICK_INTERVAL_MS").ok(),
                DEFAULT_TICK_INTERVAL_MS,
            )?,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Parses an optional raw value, falling back to `default` when it is absent.
fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid value for {}: {}", name, e))),
    }
}

/// Exams store a positive duration, so a zero default could never be used.
fn non_zero(name: &str, value: u32) -> Result<u32, AppError> {
    if value == 0 {
        return Err(AppError::Config(format!("{} must be greater than 0", name)));
    }
    Ok(value)
}
