//! Domain identifiers.
//!
//! # RecordId
//! Record の識別子は 1 から始まる単調増加の整数です。
//! - 0 は「未指定」を意味し、発番されることはありません
//! - 一度発番した値はプロセスが生きている間は再利用しません（削除後も）
//! - JSON では素の数値としてシリアライズされます

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::RecordError;

/// Identifier of a Record.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// u64 から RecordId を作成（0 も作れるが、リポジトリ側で弾かれる）
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// 外部入力（パスパラメータなど）から RecordId を作る
    ///
    /// 0 以下は `ParamInvalid` になります。
    pub fn parse(raw: i64) -> Result<Self, RecordError> {
        if raw <= 0 {
            return Err(RecordError::ParamInvalid(format!(
                "id must be a positive integer, got {raw}"
            )));
        }
        Ok(Self(raw as u64))
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// 0 は「id 未指定」
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
