//! records-core
//!
//! Concurrency-safe in-memory record store and the service on top of it.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（RecordId, Record, Status, RecordError）
//! - **lock**: 排他制御（RowLockManager, IdAllocator）
//! - **store**: 並行マップ（KeyedStore）
//! - **ports**: 抽象化レイヤー（RecordRepository）
//! - **impls**: 実装（InMemoryRecordRepo）
//! - **app**: ユースケース層（RecordService, ServiceBuilder, RetryPolicy）
//! - **config**: 設定（Config）
//! - **observability**: tracing の初期化と集計ビュー
//! - **seed**: 固定のサンプルレコード

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod lock;
pub mod observability;
pub mod ports;
pub mod seed;
pub mod store;

pub use app::{RecordService, RetryPolicy, ServiceBuilder};
pub use config::Config;
pub use domain::{ErrorKind, NewRecord, Record, RecordError, RecordId, RecordPatch, Status, UpdateRecordParams};
pub use impls::InMemoryRecordRepo;
pub use lock::{LockError, RowLockManager};
pub use ports::RecordRepository;
