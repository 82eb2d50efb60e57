//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! サービス層はここで定義した trait にのみ依存します。

pub mod record_repository;

pub use self::record_repository::RecordRepository;
