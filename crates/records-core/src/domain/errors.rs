//! Errors - エラー型と分類
//!
//! # 分類
//! - ParamInvalid: 呼び出し側で直すべき入力エラー（リトライ無意味）
//! - NotFound: 対象 id が存在しない（終端、リトライしない）
//! - LockTimeout: ロック待ちの上限超過（一時的、バックオフ後にリトライ可）
//!
//! どのエラーもプロセスにとって致命的ではなく、常に値として呼び出し元に返します。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::RecordId;
use crate::lock::LockError;

/// ErrorKind は運用上の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ParamInvalid,
    NotFound,
    LockTimeout,
}

impl ErrorKind {
    /// Stable application error code (carried in transport error bodies).
    pub const fn code(self) -> u32 {
        match self {
            ErrorKind::ParamInvalid => 1000,
            ErrorKind::NotFound => 1001,
            ErrorKind::LockTimeout => 1002,
        }
    }

    /// HTTP status a transport layer should answer with.
    ///
    /// LockTimeout はサーバ側の一時的な失敗として 500 に寄せる（404 ではない）。
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorKind::ParamInvalid => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::LockTimeout => 500,
        }
    }
}

/// RecordError はレコード操作のドメインエラー
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid parameter: {0}")]
    ParamInvalid(String),

    #[error("record not found: id={0}")]
    NotFound(RecordId),

    #[error(transparent)]
    LockTimeout(#[from] LockError),
}

impl RecordError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::ParamInvalid(_) => ErrorKind::ParamInvalid,
            RecordError::NotFound(_) => ErrorKind::NotFound,
            RecordError::LockTimeout(_) => ErrorKind::LockTimeout,
        }
    }

    pub fn code(&self) -> u32 {
        self.kind().code()
    }

    pub fn http_status(&self) -> u16 {
        self.kind().http_status()
    }

    /// Only lock timeouts are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RecordError::LockTimeout(_))
    }
}
