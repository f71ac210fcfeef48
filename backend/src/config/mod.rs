//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token secrets and lifetimes, rate-limit
//! policy and the trusted web origin.

use anyhow::{Context, Result, anyhow};
use chrono::{TimeDelta, Utc};
use std::env;

const DEFAULT_RATE_LIMIT_MAX: u32 = 10;
const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub server_port: u16,
    pub api_prefix: String,
    pub api_version: String,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    /// Access token lifetime in milliseconds
    pub access_expires_in_ms: u64,
    /// Refresh token lifetime in milliseconds
    pub refresh_expires_in_ms: u64,
    pub rate_limit_max: u32,
    pub rate_limit_window_ms: u64,
    pub web_origin: String,
    pub refresh_cookie_path: String,
    pub is_production: bool,
    pub seed: SeedConfig,
}

/// Startup seeding options.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub admin_enabled: bool,
    pub admin_email: String,
    pub admin_password: String,
    pub user_count: u32,
    pub force: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://user_management.db?mode=rwc".to_string());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let api_prefix = env::var("API_PREFIX").unwrap_or_else(|_| "api".to_string());
        let api_version = env::var("API_VERSION").unwrap_or_else(|_| "v1".to_string());

        let jwt_access_secret =
            env::var("JWT_ACCESS_SECRET").unwrap_or_else(|_| "change-me-access".to_string());
        let jwt_refresh_secret =
            env::var("JWT_REFRESH_SECRET").unwrap_or_else(|_| "change-me-refresh".to_string());

        let access_expires_in =
            env::var("JWT_ACCESS_EXPIRES_IN").unwrap_or_else(|_| "15m".to_string());
        let access_expires_in_ms = parse_duration_ms(&access_expires_in)
            .ok_or_else(|| anyhow!("JWT_ACCESS_EXPIRES_IN is not a valid duration"))?;

        let refresh_expires_in =
            env::var("JWT_REFRESH_EXPIRES_IN").unwrap_or_else(|_| "7d".to_string());
        let refresh_expires_in_ms = parse_duration_ms(&refresh_expires_in)
            .ok_or_else(|| anyhow!("JWT_REFRESH_EXPIRES_IN is not a valid duration"))?;

        // Unparsable rate-limit values fall back to the defaults instead of failing.
        let rate_limit_max = env::var("AUTH_RATE_LIMIT_MAX")
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_MAX);
        let rate_limit_window_ms = env::var("AUTH_RATE_LIMIT_WINDOW_MS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_MS);

        let web_origin =
            env::var("WEB_ORIGIN").unwrap_or_else(|_| "http://localhost:4200".to_string());
        let refresh_cookie_path =
            env::var("REFRESH_COOKIE_PATH").unwrap_or_else(|_| "/auth".to_string());

        let is_production = env::var("APP_ENV")
            .or_else(|_| env::var("NODE_ENV"))
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let seed = SeedConfig::from_env()?;

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            server_port,
            api_prefix,
            api_version,
            jwt_access_secret,
            jwt_refresh_secret,
            access_expires_in_ms,
            refresh_expires_in_ms,
            rate_limit_max,
            rate_limit_window_ms,
            web_origin,
            refresh_cookie_path,
            is_production,
            seed,
        })
    }

    /// Path every API route is mounted under, e.g. `/api/v1`.
    pub fn api_base_path(&self) -> String {
        let prefix = self.api_prefix.trim_matches('/');
        let version = self.api_version.trim_matches('/');

        let joined = [prefix, version]
            .iter()
            .filter(|segment| !segment.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");

        format!("/{joined}")
    }
}

impl SeedConfig {
    fn from_env() -> Result<Self> {
        let admin_enabled = env::var("SEED_ADMIN").map(|v| v != "0").unwrap_or(true);
        let admin_email = env::var("ADMIN_EMAIL")
            .unwrap_or_else(|_| "admin@example.com".to_string())
            .trim()
            .to_lowercase();
        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin12345".to_string());

        let user_count = env::var("SEED_COUNT")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u32>()
            .context("SEED_COUNT must be a valid number")?;
        let force = env::var("SEED_FORCE").map(|v| v == "1").unwrap_or(false);

        Ok(SeedConfig {
            admin_enabled,
            admin_email,
            admin_password,
            user_count,
            force,
        })
    }
}

/// Parses a lifetime such as `15m`, `7d`, `30s`, `12h` or a bare number of
/// milliseconds into milliseconds.
///
/// Lifetimes that would push a token expiry past chrono's range are rejected.
pub fn parse_duration_ms(value: &str) -> Option<u64> {
    parse_duration_value(value).filter(|ms| lifetime_in_range(*ms))
}

fn lifetime_in_range(ms: u64) -> bool {
    i64::try_from(ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .is_some()
}

fn parse_duration_value(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return trimmed.parse::<u64>().ok();
    }

    let unit_start = trimmed.len() - trimmed.chars().last()?.len_utf8();
    let (amount, unit) = trimmed.split_at(unit_start);
    if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let multiplier = match unit {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => return None,
    };

    amount.parse::<u64>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
impl Config {
    /// Configuration used by in-crate tests; never reads the environment.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 3,
            server_port: 0,
            api_prefix: "api".to_string(),
            api_version: "v1".to_string(),
            jwt_access_secret: "test-access-secret".to_string(),
            jwt_refresh_secret: "test-refresh-secret".to_string(),
            access_expires_in_ms: 15 * 60_000,
            refresh_expires_in_ms: 7 * 86_400_000,
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window_ms: DEFAULT_RATE_LIMIT_WINDOW_MS,
            web_origin: "http://localhost:4200".to_string(),
            refresh_cookie_path: "/auth".to_string(),
            is_production: false,
            seed: SeedConfig {
                admin_enabled: false,
                admin_email: "admin@example.com".to_string(),
                admin_password: "admin12345".to_string(),
                user_count: 0,
                force: false,
            },
        }
    }
}
