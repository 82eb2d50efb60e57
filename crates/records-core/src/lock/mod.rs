//! Lock - 排他制御
//!
//! # 構成
//! - **RowLockManager**: キーごとの排他ロック（遅延生成・待ち時間上限付き）
//! - **IdAllocator**: 作成ロック + 単調増加カウンタ
//!
//! # 方針
//! - どの取得も待ち時間に上限がある（上限超過は `LockError::Timeout`）
//! - タイムアウトした呼び出し元はロックを一切保持しない
//! - 異なるキー同士は互いにブロックしない

mod allocator;
mod row_lock;

pub use self::allocator::{Allocation, IdAllocator};
pub use self::row_lock::{RowLockGuard, RowLockManager};

use std::fmt::Debug;
use std::time::Duration;

use thiserror::Error;

/// LockError はロック取得の失敗
///
/// タイムアウトが唯一の失敗。呼び出し元にはリトライ可能な状態として伝える。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("lock timeout: key={key} waited={waited:?}")]
    Timeout { key: String, waited: Duration },
}

impl LockError {
    pub(crate) fn timeout(key: &impl Debug, waited: Duration) -> Self {
        LockError::Timeout {
            key: format!("{key:?}"),
            waited,
        }
    }
}
