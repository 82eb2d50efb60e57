//! ServiceBuilder - サービスの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() 時に Config を検証し、不正なら BuildError を返す

use std::time::Duration;

use super::service::RecordService;
use crate::config::{Config, ConfigError};
use crate::impls::InMemoryRecordRepo;

/// ServiceBuilder はインメモリの RecordService を構築
///
/// # 使用例
/// ```ignore
/// let service = ServiceBuilder::new()
///     .config(Config::from_env()?)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct ServiceBuilder {
    config: Config,
    lock_wait: Option<Duration>,
}

/// BuildError はサービス構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Finer-grained lock wait than the config's whole seconds.
    pub fn lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = Some(wait);
        self
    }

    pub fn build(self) -> Result<RecordService<InMemoryRecordRepo>, BuildError> {
        self.config.validate()?;
        let lock_wait = self.lock_wait.unwrap_or_else(|| self.config.lock_wait());
        let repo = InMemoryRecordRepo::new(lock_wait);
        Ok(RecordService::with_retry(repo, self.config.retry))
    }
}
