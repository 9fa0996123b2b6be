//! Settings read from the process environment (optionally seeded from `.env`).

use crate::tmdb::DEFAULT_API_URL;
use std::{str::FromStr, time::Duration};

pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const TMDB_TOKEN: &str = "TMDB_TOKEN";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("You need to set the bot's {what} through the '{var}' environment variable.")]
    Missing { var: &'static str, what: &'static str },
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Tokens are required, everything else has a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub telegram_token: String,
    pub tmdb_token: String,
    pub tmdb_api_url: String,
    pub tmdb_timeout: Duration,
    pub query_workers: usize,
    pub queue_capacity: usize,
    pub search_cache_ttl: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = get(TELEGRAM_TOKEN).ok_or(ConfigError::Missing {
            var: TELEGRAM_TOKEN,
            what: "Telegram token",
        })?;
        let tmdb_token = get(TMDB_TOKEN).ok_or(ConfigError::Missing {
            var: TMDB_TOKEN,
            what: "TMDB token",
        })?;

        let tmdb_api_url = get("TMDB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let tmdb_timeout = Duration::from_secs(parse(&get, "TMDB_TIMEOUT_SECS", 10u64)?);
        let query_workers = positive(&get, "QUERY_WORKERS", 1)?;
        let queue_capacity = positive(&get, "QUEUE_CAPACITY", 1000)?;
        let search_cache_ttl = Duration::from_secs(parse(&get, "SEARCH_CACHE_TTL_SECS", 60u64)?);

        Ok(Self {
            telegram_token,
            tmdb_token,
            tmdb_api_url,
            tmdb_timeout,
            query_workers,
            queue_capacity,
            search_cache_ttl,
        })
    }
}

fn parse<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<G>(get: &G, var: &'static str, default: usize) -> Result<usize, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match parse(get, var, default)? {
        0 => Err(ConfigError::Invalid {
            var,
            value: "0".into(),
            reason: "must be at least 1".into(),
        }),
        n => Ok(n),
    }
}
