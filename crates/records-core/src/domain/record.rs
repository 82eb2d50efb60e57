//! Record model: the entity held by the keyed store and the inputs that
//! create or modify it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::RecordError;
use super::ids::RecordId;

/// Completion status of a record.
///
/// On the wire this is the integer value (0 = incomplete, 1 = completed).
/// Any other integer is rejected with `ParamInvalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Status {
    #[default]
    Incomplete,
    Completed,
}

impl Status {
    pub const fn as_i64(self) -> i64 {
        match self {
            Status::Incomplete => 0,
            Status::Completed => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Incomplete => "incomplete",
            Status::Completed => "completed",
        }
    }
}

impl TryFrom<i64> for Status {
    type Error = RecordError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Incomplete),
            1 => Ok(Status::Completed),
            other => Err(RecordError::ParamInvalid(format!(
                "status is invalid: {other}"
            ))),
        }
    }
}

impl From<Status> for i64 {
    fn from(status: Status) -> Self {
        status.as_i64()
    }
}

impl FromStr for Status {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incomplete" | "0" => Ok(Status::Incomplete),
            "completed" | "1" => Ok(Status::Completed),
            other => Err(RecordError::ParamInvalid(format!(
                "status is invalid: `{other}`"
            ))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record.
///
/// The store owns the canonical copy; everything handed to callers is a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub status: Status,
}

impl Record {
    pub fn new(id: RecordId, name: impl Into<String>, status: Status) -> Self {
        Self {
            id,
            name: name.into(),
            status,
        }
    }

    /// Apply the supplied fields of a patch; omitted fields stay as they are.
    pub fn apply(&mut self, patch: &RecordPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Create input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    pub status: Status,
}

impl NewRecord {
    pub fn new(name: impl Into<String>, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
        }
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        validate_name(&self.name)
    }
}

/// Partial update body: `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none()
    }
}

/// Update input: target id plus the fields to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecordParams {
    pub id: RecordId,
    pub patch: RecordPatch,
}

impl UpdateRecordParams {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            patch: RecordPatch::default(),
        }
    }

    pub fn with_patch(id: RecordId, patch: RecordPatch) -> Self {
        Self { id, patch }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.patch.name = Some(name.into());
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.patch.status = Some(status);
        self
    }

    /// id は必須（0 は未指定扱い）、name は指定されたなら空白のみは不可
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.id.is_unset() {
            return Err(RecordError::ParamInvalid("id is required".to_string()));
        }
        if let Some(name) = &self.patch.name {
            validate_name(name)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), RecordError> {
    if name.trim().is_empty() {
        return Err(RecordError::ParamInvalid("name is required".to_string()));
    }
    Ok(())
}
