use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::gateway::Gateway;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub gateway: Arc<Gateway>,
    pub storage_path: PathBuf,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
}

impl AppState {
    pub fn new(db: SqlitePool, config: &Config) -> Self {
        Self {
            db,
            gateway: Arc::new(Gateway::new(config.outbound_buffer)),
            storage_path: config.storage_path.clone(),
            heartbeat_interval: config.heartbeat_interval,
            heartbeat_timeout: config.heartbeat_timeout,
        }
    }
}
