//! RecordRepository port - レコード操作の抽象化
//!
//! サービス層はこの trait だけに依存し、保持方式（インメモリなど）は知らない。
//!
//! # 実装
//! - **InMemoryRecordRepo**: プロセス内メモリ（row lock + 作成ロック + KeyedStore）

use async_trait::async_trait;

use crate::domain::{NewRecord, Record, RecordError, RecordId, UpdateRecordParams};
use crate::observability::RecordCounts;

/// RecordRepository はレコードの CRUD を提供
///
/// # 契約
/// - list は失敗しない（順序は不定）
/// - create は既存レコードを上書きしない
/// - update / delete は同じ id について完全に直列化される
/// - 失敗は常に `RecordError` として返す（panic しない）
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから同時に呼ばれる）
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// 全件取得
    async fn list(&self) -> Vec<Record>;

    /// 1 件取得（ロックは取らない）
    async fn get(&self, id: RecordId) -> Result<Record, RecordError>;

    /// 新規作成。発番した id を含むレコードを返す
    async fn create(&self, new: NewRecord) -> Result<Record, RecordError>;

    /// 部分更新。更新後のレコードを返す
    async fn update(&self, params: UpdateRecordParams) -> Result<Record, RecordError>;

    /// 削除
    async fn delete(&self, id: RecordId) -> Result<(), RecordError>;

    /// status ごとの件数
    async fn counts(&self) -> RecordCounts;
}
