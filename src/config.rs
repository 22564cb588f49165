//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable overriding the reply base delay, in milliseconds.
pub const ENV_REPLY_DELAY_MS: &str = "LISTING_ASSIST_REPLY_DELAY_MS";
/// Environment variable overriding the reply jitter, in milliseconds.
pub const ENV_REPLY_JITTER_MS: &str = "LISTING_ASSIST_REPLY_JITTER_MS";
/// Environment variable overriding the storage key prefix.
pub const ENV_KEY_PREFIX: &str = "LISTING_ASSIST_KEY_PREFIX";

/// Sync engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed part of the simulated assistant "thinking" latency.
    pub reply_base_delay: Duration,
    /// Upper bound of the random extra latency added on top of the base.
    pub reply_jitter: Duration,
    /// Prefix of the storage key; the mode is appended as `{prefix}:{mode}`.
    pub key_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reply_base_delay: Duration::from_millis(800),
            reply_jitter: Duration::from_millis(700),
            key_prefix: "listing-assist:draft".to_string(),
        }
    }
}

impl SyncConfig {
    /// Build a config from defaults overridden by environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config reading overrides through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_REPLY_DELAY_MS) {
            config.reply_base_delay = parse_millis(ENV_REPLY_DELAY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REPLY_JITTER_MS) {
            config.reply_jitter = parse_millis(ENV_REPLY_JITTER_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_KEY_PREFIX) {
            let prefix = raw.trim();
            if prefix.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_KEY_PREFIX.to_string(),
                    message: "prefix must not be empty".to_string(),
                });
            }
            config.key_prefix = prefix.to_string();
        }

        Ok(config)
    }

    /// A config with no reply latency at all.
    pub fn instant() -> Self {
        Self {
            reply_base_delay: Duration::ZERO,
            reply_jitter: Duration::ZERO,
            ..Self::default()
        }
    }
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected milliseconds, got {raw:?} ({e})"),
        })
}
