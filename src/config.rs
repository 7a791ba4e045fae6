// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::AppError;

/// Letters a generated test id may start with.
pub const TEST_ID_PREFIXES: &str = "TABCDEF";
/// Number of random digits after the prefix letter.
pub const TEST_ID_DIGITS: usize = 4;
/// Separates a user-supplied test id from the answer text ("T100-1a2b").
pub const TEST_ID_SEPARATOR: char = '-';

pub const DEFAULT_DATA_FILE: &str = "data.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_file: PathBuf,
    pub operator_ids: Vec<i64>,
    pub bind_addr: SocketAddr,
    pub session_ttl: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let operator_ids = lookup("OPERATOR_IDS")
            .ok_or_else(|| AppError::Config("OPERATOR_IDS must be set".to_string()))
            .and_then(|raw| parse_operator_ids(&raw))?;

        let data_file = lookup("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let session_ttl = match lookup("SESSION_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| AppError::Config(format!("SESSION_TTL_SECS is invalid: {}", e)))?,
            None => DEFAULT_SESSION_TTL_SECS,
        };

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            data_file,
            operator_ids,
            bind_addr,
            session_ttl: Duration::from_secs(session_ttl),
            rust_log,
        })
    }

    pub fn is_operator(&self, caller_id: i64) -> bool {
        self.operator_ids.contains(&caller_id)
    }
}

/// Parses a comma-separated allow-list such as `"7926224444, 1229135388"`.
pub fn parse_operator_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| AppError::Config(format!("'{}' is not a valid operator id", part)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if ids.is_empty() {
        return Err(AppError::Config("OPERATOR_IDS is empty".to_string()));
    }

    Ok(ids)
}
