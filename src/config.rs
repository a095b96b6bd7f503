//! Server configuration from environment variables.

use crate::logic::SchedulePlanner;
use crate::oracle::{
    ChatCompletionOracle, OracleConfig, OracleError, DEFAULT_ORACLE_MODEL, DEFAULT_ORACLE_URL,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HOST (default 0.0.0.0)
    pub host: String,
    /// PORT (default 8080)
    pub port: u16,
    /// Tournaments not accessed for this long are removed (INACTIVITY_TIMEOUT_HOURS, default 12).
    pub inactivity_timeout: Duration,
    /// Present only when ORACLE_API_KEY is set.
    pub oracle: Option<OracleConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(get("PORT"), "PORT", 8080u16)?;
        let hours = parse_or(get("INACTIVITY_TIMEOUT_HOURS"), "INACTIVITY_TIMEOUT_HOURS", 12u64)?;

        let oracle = match get("ORACLE_API_KEY") {
            Some(api_key) => {
                let secs = parse_or(get("ORACLE_TIMEOUT_SECS"), "ORACLE_TIMEOUT_SECS", 10u64)?;
                Some(OracleConfig {
                    url: get("ORACLE_URL").unwrap_or_else(|| DEFAULT_ORACLE_URL.to_string()),
                    api_key,
                    model: get("ORACLE_MODEL").unwrap_or_else(|| DEFAULT_ORACLE_MODEL.to_string()),
                    timeout: Duration::from_secs(secs),
                })
            }
            None => None,
        };

        Ok(Self {
            host,
            port,
            inactivity_timeout: Duration::from_secs(hours * 3600),
            oracle,
        })
    }

    /// Schedule planner for this configuration: oracle-backed if configured.
    pub fn planner(&self) -> Result<SchedulePlanner, OracleError> {
        match &self.oracle {
            Some(config) => {
                let oracle = ChatCompletionOracle::new(config.clone())?;
                Ok(SchedulePlanner::with_oracle(Arc::new(oracle), config.timeout))
            }
            None => Ok(SchedulePlanner::deterministic()),
        }
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value: v }),
        None => Ok(default),
    }
}
