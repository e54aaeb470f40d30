//! Individually blocked phone number.
//!
//! # Invariants
//! - `area_code == national_number[0..3]`.
//! - `national_number` is exactly 10 digits, so `e164()` is always defined.

use crate::model::PolicyValidationError;
use crate::phone::normalize::{E164Number, NationalNumber};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BlockedNumberId = Uuid;

/// Where a blocked number was first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource {
    /// Detected from an incoming call.
    Call,
    /// Detected by the message filter.
    Text,
    /// Entered by the user.
    Manual,
}

impl BlockSource {
    /// Stable label used by FFI envelopes and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Text => "text",
            Self::Manual => "manual",
        }
    }

    /// Parses the stable label produced by `as_str`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "call" => Some(Self::Call),
            "text" => Some(Self::Text),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// One concrete number blocked outside of (or in addition to) area-code rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockedNumberRecord")]
pub struct BlockedNumber {
    pub id: BlockedNumberId,
    pub national_number: NationalNumber,
    pub area_code: String,
    pub source: BlockSource,
    /// Unix epoch milliseconds.
    pub blocked_at: i64,
}

#[derive(Deserialize)]
struct BlockedNumberRecord {
    id: BlockedNumberId,
    national_number: NationalNumber,
    area_code: String,
    source: BlockSource,
    blocked_at: i64,
}

impl TryFrom<BlockedNumberRecord> for BlockedNumber {
    type Error = PolicyValidationError;

    fn try_from(value: BlockedNumberRecord) -> Result<Self, Self::Error> {
        let number = Self {
            id: value.id,
            national_number: value.national_number,
            area_code: value.area_code,
            source: value.source,
            blocked_at: value.blocked_at,
        };
        number.validate()?;
        Ok(number)
    }
}

impl BlockedNumber {
    /// Creates a record with a generated id; the area code is derived.
    pub fn new(national_number: NationalNumber, source: BlockSource, blocked_at: i64) -> Self {
        let area_code = national_number.area_code().to_string();
        Self {
            id: Uuid::new_v4(),
            national_number,
            area_code,
            source,
            blocked_at,
        }
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.id.is_nil() {
            return Err(PolicyValidationError::NilId);
        }
        if self.national_number.area_code() != self.area_code {
            return Err(PolicyValidationError::AreaCodeMismatch {
                area_code: self.area_code.clone(),
                national_number: self.national_number.to_string(),
            });
        }
        Ok(())
    }

    /// E.164-style integer with the NANP country code.
    pub fn e164(&self) -> E164Number {
        self.national_number.e164()
    }
}
