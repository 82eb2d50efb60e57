//! RecordService - ユースケース層
//!
//! トランスポート層（HTTP など）が呼ぶ入口。
//! - 永続化の詳細は `RecordRepository` に委譲する
//! - 操作ごとに tracing のスパンとイベントを出す
//! - リトライ可能な失敗（ロックタイムアウト）だけを `RetryPolicy` に従って再試行する
//!
//! NotFound は「削除と更新の競合で負けた側」の正常な結果でもあるので、
//! 大きな声では報告しない（debug レベル）。

use std::future::Future;

use tracing::{debug, info, instrument, warn};

use super::retry::RetryPolicy;
use crate::domain::{NewRecord, Record, RecordError, RecordId, Status, UpdateRecordParams};
use crate::observability::RecordCounts;
use crate::ports::RecordRepository;

/// Use-case service over a record repository.
pub struct RecordService<R: RecordRepository> {
    repo: R,
    retry: RetryPolicy,
}

impl<R: RecordRepository> RecordService<R> {
    /// Service without retries.
    pub fn new(repo: R) -> Self {
        Self::with_retry(repo, RetryPolicy::none())
    }

    pub fn with_retry(repo: R, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// All records, order unspecified. Never fails.
    #[instrument(skip_all)]
    pub async fn list(&self) -> Vec<Record> {
        let records = self.repo.list().await;
        debug!(count = records.len(), "listed records");
        records
    }

    #[instrument(skip_all, fields(id = %id))]
    pub async fn get(&self, id: RecordId) -> Result<Record, RecordError> {
        let result = self.repo.get(id).await;
        log_outcome("get", &result);
        result
    }

    pub async fn create(&self, name: impl Into<String>, status: Status) -> Result<Record, RecordError> {
        self.create_record(NewRecord::new(name, status)).await
    }

    #[instrument(skip_all, fields(name = %new.name, status = %new.status))]
    pub async fn create_record(&self, new: NewRecord) -> Result<Record, RecordError> {
        let result = self.retrying("create", || self.repo.create(new.clone())).await;
        if let Ok(record) = &result {
            info!(id = %record.id, "record created");
        }
        log_outcome("create", &result);
        result
    }

    #[instrument(skip_all, fields(id = %params.id))]
    pub async fn update(&self, params: UpdateRecordParams) -> Result<Record, RecordError> {
        let result = self.retrying("update", || self.repo.update(params.clone())).await;
        if let Ok(record) = &result {
            info!(name = %record.name, status = %record.status, "record updated");
        }
        log_outcome("update", &result);
        result
    }

    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: RecordId) -> Result<(), RecordError> {
        let result = self.retrying("delete", || self.repo.delete(id)).await;
        if result.is_ok() {
            info!("record deleted");
        }
        log_outcome("delete", &result);
        result
    }

    pub async fn counts(&self) -> RecordCounts {
        self.repo.counts().await
    }

    async fn retrying<T, F, Fut>(&self, op: &'static str, mut run: F) -> Result<T, RecordError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RecordError>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match run().await {
                Err(err) if err.is_retryable() && self.retry.allows_retry(attempts) => {
                    let delay = self.retry.next_delay(attempts);
                    warn!(
                        op,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after lock timeout"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

fn log_outcome<T>(op: &'static str, result: &Result<T, RecordError>) {
    let Err(err) = result else {
        return;
    };
    match err {
        RecordError::LockTimeout(_) => warn!(op, code = err.code(), error = %err, "operation timed out"),
        RecordError::NotFound(_) | RecordError::ParamInvalid(_) => {
            debug!(op, code = err.code(), error = %err, "operation rejected")
        }
    }
}
