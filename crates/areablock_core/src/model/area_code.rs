//! Area-code blocking rule.
//!
//! # Invariants
//! - `code` matches `^[0-9]{3}$`.
//! - `block_calls` and `block_texts` toggle independently.
//! - Code uniqueness is owned by the editing service, not this type.

use crate::model::PolicyValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static AREA_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{3}$").expect("valid area code regex"));

pub type RuleId = Uuid;

/// One user-authored area-code rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AreaCodeRuleRecord")]
pub struct AreaCodeRule {
    pub id: RuleId,
    /// Three ASCII digits, e.g. `"206"`.
    pub code: String,
    pub block_calls: bool,
    pub block_texts: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

#[derive(Deserialize)]
struct AreaCodeRuleRecord {
    id: RuleId,
    code: String,
    block_calls: bool,
    block_texts: bool,
    created_at: i64,
}

impl TryFrom<AreaCodeRuleRecord> for AreaCodeRule {
    type Error = PolicyValidationError;

    fn try_from(value: AreaCodeRuleRecord) -> Result<Self, Self::Error> {
        let rule = Self {
            id: value.id,
            code: value.code,
            block_calls: value.block_calls,
            block_texts: value.block_texts,
            created_at: value.created_at,
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl AreaCodeRule {
    /// Creates a rule with a generated id.
    ///
    /// # Errors
    /// - Returns `InvalidAreaCode` when `code` is not 3 digits.
    pub fn new(
        code: impl Into<String>,
        block_calls: bool,
        block_texts: bool,
        created_at: i64,
    ) -> Result<Self, PolicyValidationError> {
        Self::with_id(Uuid::new_v4(), code, block_calls, block_texts, created_at)
    }

    /// Creates a rule with a caller-provided id (import and test paths).
    pub fn with_id(
        id: RuleId,
        code: impl Into<String>,
        block_calls: bool,
        block_texts: bool,
        created_at: i64,
    ) -> Result<Self, PolicyValidationError> {
        let rule = Self {
            id,
            code: code.into(),
            block_calls,
            block_texts,
            created_at,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), PolicyValidationError> {
        if self.id.is_nil() {
            return Err(PolicyValidationError::NilId);
        }
        if !is_area_code(&self.code) {
            return Err(PolicyValidationError::InvalidAreaCode(self.code.clone()));
        }
        Ok(())
    }

    /// Numeric value of `code`, used for ordering ranges.
    pub fn code_value(&self) -> Option<u16> {
        if is_area_code(&self.code) {
            self.code.parse().ok()
        } else {
            None
        }
    }

    /// Whether this rule blocks anything at all.
    pub fn is_active(&self) -> bool {
        self.block_calls || self.block_texts
    }
}

/// Returns whether `value` is a syntactically valid area code.
pub fn is_area_code(value: &str) -> bool {
    AREA_CODE_RE.is_match(value)
}
