use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::bookmark::source::{DEFAULT_MAX_BODY_BYTES, DEFAULT_USER_AGENT};
use crate::bookmark::FaviconFallback;

pub const MIN_JWT_SECRET_LEN: usize = 32;
pub const MIN_FETCH_TIMEOUT_SECS: u64 = 10;
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("JWT_SECRET must be at least 32 characters")]
    WeakSecret,

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub fetch_timeout: Duration,
    pub fetch_user_agent: String,
    pub fetch_max_body_bytes: usize,
    pub allow_private_hosts: bool,
    pub favicon_fallback: FaviconFallback,
    pub is_dev: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let timeout_secs: u64 = parse_var("FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?;

        Ok(Config {
            jwt_secret,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_var("SERVER_PORT", 8080)?,
            fetch_timeout: Duration::from_secs(
                timeout_secs.clamp(MIN_FETCH_TIMEOUT_SECS, MAX_FETCH_TIMEOUT_SECS),
            ),
            fetch_user_agent: env::var("FETCH_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            fetch_max_body_bytes: parse_var("FETCH_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            allow_private_hosts: parse_var("ALLOW_PRIVATE_HOSTS", false)?,
            favicon_fallback: parse_var("FAVICON_FALLBACK", FaviconFallback::None)?,
            is_dev: env::var("APP_ENV").as_deref() != Ok("production"),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Read `name`, falling back to `default` when unset or blank.
fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .to_ascii_lowercase()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        }
        _ => Ok(default),
    }
}
