//! Config - プロセス全体の設定
//!
//! # 読み込み元
//! - `Config::default()`: lock_wait_secs = 5、リトライなし
//! - `Config::from_json_str`: JSON（欠けたフィールドはデフォルト）
//! - `Config::from_env`: 環境変数（未設定ならデフォルト）
//!
//! どの経路でも最後に `validate()` を通す。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::app::retry::RetryPolicy;

pub const ENV_LOCK_WAIT_SECS: &str = "RECORDS_LOCK_WAIT_SECS";
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "RECORDS_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "RECORDS_RETRY_BASE_DELAY_MS";
pub const ENV_RETRY_MULTIPLIER: &str = "RECORDS_RETRY_MULTIPLIER";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "RECORDS_RETRY_MAX_DELAY_MS";

const DEFAULT_LOCK_WAIT_SECS: u64 = 5;

/// ConfigError は設定の読み込み・検証エラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {name}: `{value}`")]
    Env { name: &'static str, value: String },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bounded wait for row and creation locks, in whole seconds.
    pub lock_wait_secs: u64,

    /// Retry of lock timeouts at the service layer.
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_wait_secs: DEFAULT_LOCK_WAIT_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn lock_wait(&self) -> Duration {
        Duration::from_secs(self.lock_wait_secs)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the `RECORDS_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `from_env` with an injectable lookup (tests don't touch the real env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(v) = parse_var(&lookup, ENV_LOCK_WAIT_SECS)? {
            config.lock_wait_secs = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_MAX_ATTEMPTS)? {
            config.retry.max_attempts = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_BASE_DELAY_MS)? {
            config.retry.base_delay_ms = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_MULTIPLIER)? {
            config.retry.multiplier = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_RETRY_MAX_DELAY_MS)? {
            config.retry.max_delay_ms = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "retry.multiplier must be a finite number >= 1.0, got {}",
                self.retry.multiplier
            )));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.max_delay_ms ({}) is below retry.base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Env { name, value: raw })
}
