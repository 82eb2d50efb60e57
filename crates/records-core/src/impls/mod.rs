//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryRecordRepo**: プロセス内メモリの RecordRepository
//!
//! 永続化する実装は持たない（プロセスが生きている間だけのストア）。

pub mod inmem_repo;

pub use self::inmem_repo::InMemoryRecordRepo;
