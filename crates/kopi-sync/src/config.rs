//! # Sync Configuration
//!
//! Tunables for the outbox worker. All fields have serde defaults, so a
//! partial config file (or none at all) yields a working setup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outbox worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Seconds between drain passes.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum outbox rows processed per pass.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Attempts after which a row is parked (kept pending, no longer
    /// retried automatically).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Age in days after which synced rows are purged from the outbox.
    #[serde(default = "default_cleanup_after_days")]
    pub cleanup_after_days: u32,
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_batch_size() -> u32 {
    25
}

fn default_max_attempts() -> i64 {
    5
}

fn default_cleanup_after_days() -> u32 {
    7
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            poll_interval_secs: default_poll_interval_secs(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            cleanup_after_days: default_cleanup_after_days(),
        }
    }
}

impl SyncConfig {
    /// Poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
