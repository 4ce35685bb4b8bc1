use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::reconcile::SyncStrategy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub csv_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub sync_interval: Duration,
    pub sync_strategy: SyncStrategy,
    pub sync_on_start: bool,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://data/player.db".to_string(),
            csv_path: PathBuf::from("./csv/Player.csv"),
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8800,
            sync_interval: Duration::from_secs(60),
            sync_strategy: SyncStrategy::Incremental,
            sync_on_start: true,
            default_page_size: 250,
            max_page_size: 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let sync_secs: u64 = parse_or("SYNC_INTERVAL_SECS", &lookup, defaults.sync_interval.as_secs())?;
        if sync_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SYNC_INTERVAL_SECS",
                value: sync_secs.to_string(),
            });
        }

        let default_page_size: i64 = parse_or("DEFAULT_PAGE_SIZE", &lookup, defaults.default_page_size)?;
        let max_page_size: i64 = parse_or("MAX_PAGE_SIZE", &lookup, defaults.max_page_size)?;
        if max_page_size < 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_PAGE_SIZE",
                value: max_page_size.to_string(),
            });
        }
        if default_page_size < 0 || default_page_size > max_page_size {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_PAGE_SIZE",
                value: default_page_size.to_string(),
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            csv_path: lookup("CSV_PATH").map(PathBuf::from).unwrap_or(defaults.csv_path),
            host: parse_or("HOST", &lookup, defaults.host)?,
            port: parse_or("PORT", &lookup, defaults.port)?,
            sync_interval: Duration::from_secs(sync_secs),
            sync_strategy: parse_or("SYNC_STRATEGY", &lookup, defaults.sync_strategy)?,
            sync_on_start: lookup("SYNC_ON_START")
                .map(|raw| parse_bool(&raw, defaults.sync_on_start))
                .unwrap_or(defaults.sync_on_start),
            default_page_size,
            max_page_size,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        _ => Ok(default),
    }
}

/// Lenient boolean: yes-ish and no-ish spellings, anything else is `default`.
pub fn parse_bool(raw: &str, default: bool) -> bool {
    match raw.trim().to_lowercase().as_str() {
        "1" | "y" | "yes" | "true" => true,
        "0" | "n" | "no" | "false" => false,
        _ => default,
    }
}
