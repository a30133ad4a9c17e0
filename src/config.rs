use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::heartbeat::{DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_TIMEOUT};

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub storage_path: PathBuf,
    /// Events queued for a slow client beyond this are dropped.
    pub outbound_buffer: usize,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "sqlite:relay.db?mode=rwc".to_string(),
            storage_path: PathBuf::from("./cdn"),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let outbound_buffer = env_parsed::<usize>("RELAY_OUTBOUND_BUFFER")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.outbound_buffer);

        let heartbeat_interval = env_parsed::<u64>("RELAY_HEARTBEAT_INTERVAL")
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.heartbeat_interval);

        // Timeout must exceed the interval.
        let heartbeat_timeout = env_parsed::<u64>("RELAY_HEARTBEAT_TIMEOUT")
            .map(Duration::from_secs)
            .filter(|t| *t > heartbeat_interval)
            .unwrap_or_else(|| defaults.heartbeat_timeout.max(heartbeat_interval * 2));

        Self {
            port: env_parsed("PORT").unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            storage_path: std::env::var("RELAY_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            outbound_buffer,
            heartbeat_interval,
            heartbeat_timeout,
        }
    }
}
