//! Domain model (ids, records, errors).
//!
//! - ids: RecordId（単調増加の整数 id）
//! - record: Record / Status / NewRecord / RecordPatch / UpdateRecordParams
//! - errors: RecordError と運用分類 ErrorKind

pub mod errors;
pub mod ids;
pub mod record;

pub use self::errors::{ErrorKind, RecordError};
pub use self::ids::RecordId;
pub use self::record::{NewRecord, Record, RecordPatch, Status, UpdateRecordParams};
