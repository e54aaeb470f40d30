//! Blocking-policy domain model.
//!
//! # Responsibility
//! - Define the records the editing UI produces and the extensions consume.
//! - Provide the read-only accessors the engine resolves rules through.
//!
//! # Invariants
//! - Every record is identified by a stable v4 `Uuid`.
//! - A `PolicySnapshot` is never mutated in place; edits return a new value.

pub mod area_code;
pub mod blocked_number;
pub mod policy;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Validation failures shared by policy records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyValidationError {
    NilId,
    InvalidAreaCode(String),
    NoChannelSelected,
    AreaCodeMismatch {
        area_code: String,
        national_number: String,
    },
}

impl Display for PolicyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "record id must not be nil"),
            Self::InvalidAreaCode(value) => {
                write!(f, "area code must be exactly 3 digits, got `{value}`")
            }
            Self::NoChannelSelected => {
                write!(f, "at least one of calls or texts must be blocked")
            }
            Self::AreaCodeMismatch {
                area_code,
                national_number,
            } => write!(
                f,
                "area code `{area_code}` does not prefix national number `{national_number}`"
            ),
        }
    }
}

impl Error for PolicyValidationError {}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}
