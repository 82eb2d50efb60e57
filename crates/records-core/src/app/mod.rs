//! App - アプリケーション層
//!
//! ports を組み合わせてユースケースを実装します。
//!
//! # 主要コンポーネント
//! - **RecordService**: list / get / create / update / delete の入口
//! - **ServiceBuilder**: 設定の検証とワイヤリング
//! - **RetryPolicy**: ロックタイムアウトの再試行間隔
//! - **response**: トランスポート層向けのレスポンス形

pub mod builder;
pub mod response;
pub mod retry;
pub mod service;

pub use self::builder::{BuildError, ServiceBuilder};
pub use self::response::{ErrorResponse, OkResponse};
pub use self::retry::RetryPolicy;
pub use self::service::RecordService;
