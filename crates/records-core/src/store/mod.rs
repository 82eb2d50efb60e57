//! Store - レコードの保持
//!
//! # KeyedStore
//! - dashmap によるシャーディングされた並行マップ（id → Record）
//! - 読み取りはロック（row lock / 作成ロック）を取らない
//! - 書き込みは呼び出し側が対応するロックを保持している前提
//!   （ストア自体はマップ 1 操作単位の原子性以上の直列化はしない）

mod keyed;

pub use self::keyed::KeyedStore;
