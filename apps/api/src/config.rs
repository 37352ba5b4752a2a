// Runtime configuration
// Read from the process environment after `.env` has been loaded

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub context_sync_interval: Duration,
    pub conflict_scan_interval: Duration,
    pub progress_interval: Duration,
    pub message_replay_capacity: usize,
    pub event_bus_capacity: usize,
    pub auto_resolve_conflicts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            db_max_connections: 5,
            context_sync_interval: Duration::from_secs(300),
            conflict_scan_interval: Duration::from_secs(5),
            progress_interval: Duration::from_secs(60),
            message_replay_capacity: 50,
            event_bus_capacity: 1000,
            auto_resolve_conflicts: true,
        }
    }
}

impl Config {
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set, remote context reconciliation disabled");
        }

        Ok(Self {
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            context_sync_interval: secs_or(
                &lookup,
                "CONTEXT_SYNC_INTERVAL_SECS",
                defaults.context_sync_interval,
            )?,
            conflict_scan_interval: secs_or(
                &lookup,
                "CONFLICT_SCAN_INTERVAL_SECS",
                defaults.conflict_scan_interval,
            )?,
            progress_interval: secs_or(&lookup, "PROGRESS_INTERVAL_SECS", defaults.progress_interval)?,
            message_replay_capacity: parse_or(
                &lookup,
                "MESSAGE_REPLAY_CAPACITY",
                defaults.message_replay_capacity,
            )?,
            event_bus_capacity: parse_or(&lookup, "EVENT_BUS_CAPACITY", defaults.event_bus_capacity)?,
            auto_resolve_conflicts: parse_or(
                &lookup,
                "AUTO_RESOLVE_CONFLICTS",
                defaults.auto_resolve_conflicts,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

fn secs_or<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, name, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: "0".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
