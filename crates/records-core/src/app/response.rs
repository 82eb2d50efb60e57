//! Response envelopes for a transport layer.
//!
//! HTTP サーバはこのクレートには含めない。ここではエラー分類を
//! ステータス番号とボディの形に落とすところまでを持つ。

use serde::{Deserialize, Serialize};

use crate::domain::RecordError;

/// Error body: transport status, application code, message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub code: u32,
    pub message: String,
}

impl From<&RecordError> for ErrorResponse {
    fn from(err: &RecordError) -> Self {
        Self {
            status: err.http_status(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Success body. `code` is always 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse<T> {
    pub code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> OkResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            code: 0,
            data: Some(data),
        }
    }

    pub fn empty() -> Self {
        Self { code: 0, data: None }
    }
}
