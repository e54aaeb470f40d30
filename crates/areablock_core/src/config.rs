//! Engine tuning parameters and shared store keys.
//!
//! # Invariants
//! - `batch_size` and `max_entries` are strictly positive.
//! - `text_cache_ttl_ms` is strictly positive.

use crate::phone::normalize::NANP_COUNTRY_CODE;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store key holding the JSON array of area-code rules.
pub const AREA_CODE_RULES_KEY: &str = "blocked_area_codes";
/// Store key holding the JSON array of individually blocked numbers.
pub const BLOCKED_NUMBERS_KEY: &str = "blocked_numbers";

pub const DEFAULT_BATCH_SIZE: usize = 100_000;
pub const DEFAULT_MAX_ENTRIES: u64 = 100_000_000;
pub const DEFAULT_TEXT_CACHE_TTL_MS: i64 = 60_000;

/// Parameters shared by the enumerator, driver and classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Country code prefixed to every enumerated number.
    pub country_code: u64,
    /// Entries per emitted batch.
    pub batch_size: usize,
    /// Host-imposed ceiling on call-directory entries per request.
    pub max_entries: u64,
    /// Lifetime of the cached text-blocked area-code set.
    pub text_cache_ttl_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            country_code: NANP_COUNTRY_CODE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_entries: DEFAULT_MAX_ENTRIES,
            text_cache_ttl_ms: DEFAULT_TEXT_CACHE_TTL_MS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_entries == 0 {
            return Err(ConfigError::ZeroEntryBudget);
        }
        if self.text_cache_ttl_ms <= 0 {
            return Err(ConfigError::NonPositiveTtl(self.text_cache_ttl_ms));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    ZeroBatchSize,
    ZeroEntryBudget,
    NonPositiveTtl(i64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroBatchSize => write!(f, "batch_size must be greater than zero"),
            Self::ZeroEntryBudget => write!(f, "max_entries must be greater than zero"),
            Self::NonPositiveTtl(value) => {
                write!(f, "text_cache_ttl_ms must be positive, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}
