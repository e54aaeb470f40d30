//! Call-directory number enumerator.
//!
//! # Responsibility
//! - Select call-blocking area codes and expand each into its full block of
//!   ten million numbers.
//! - Merge individually blocked numbers outside those blocks into the same
//!   ascending stream.
//!
//! # Invariants
//! - Output is strictly ascending with no duplicates.
//! - Output depends only on the snapshot and config.
//! - `total_entries()` never exceeds the configured budget.

use crate::config::EngineConfig;
use crate::model::policy::PolicySnapshot;
use crate::phone::normalize::{area_code_base, E164Number, AREA_CODE_SPAN};
use log::warn;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationError {
    /// The expansion would need more entries than the host accepts.
    BudgetExceeded { required: u64, budget: u64 },
}

impl Display for EnumerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BudgetExceeded { required, budget } => write!(
                f,
                "call-directory expansion needs {required} entries but the budget is {budget}"
            ),
        }
    }
}

impl Error for EnumerationError {}

/// Resolved, budget-checked expansion of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationPlan {
    country_code: u64,
    /// Distinct, ascending.
    area_codes: Vec<u16>,
    /// Distinct, ascending, outside every expanded block.
    single_numbers: Vec<E164Number>,
}

/// Resolves `snapshot` into an enumeration plan.
///
/// Duplicate call-blocking codes keep their first occurrence in input order.
///
/// # Errors
/// - Returns `BudgetExceeded` when the expansion is larger than
///   `config.max_entries`.
pub fn enumerate(
    snapshot: &PolicySnapshot,
    config: &EngineConfig,
) -> Result<EnumerationPlan, EnumerationError> {
    let area_codes = call_blocked_codes(snapshot);
    let covered: BTreeSet<&str> = snapshot
        .area_code_rules
        .iter()
        .filter(|rule| rule.block_calls)
        .map(|rule| rule.code.as_str())
        .collect();

    let mut single_numbers = snapshot
        .blocked_numbers
        .iter()
        .filter(|number| !covered.contains(number.area_code.as_str()))
        .map(|number| number.national_number.e164_with_country(config.country_code))
        .collect::<Vec<_>>();
    single_numbers.sort_unstable();
    single_numbers.dedup();

    let plan = EnumerationPlan {
        country_code: config.country_code,
        area_codes,
        single_numbers,
    };

    let required = plan.total_entries();
    if required > config.max_entries {
        return Err(EnumerationError::BudgetExceeded {
            required,
            budget: config.max_entries,
        });
    }
    Ok(plan)
}

fn call_blocked_codes(snapshot: &PolicySnapshot) -> Vec<u16> {
    let mut selected = snapshot
        .area_code_rules
        .iter()
        .filter(|rule| rule.block_calls)
        .filter_map(|rule| rule.code_value())
        .collect::<Vec<_>>();

    // Equal codes collapse into the range of their first occurrence.
    selected.sort_unstable();
    let before = selected.len();
    selected.dedup();
    if selected.len() != before {
        warn!(
            "event=enumerate module=engine status=recovered error_code=duplicate_area_code dropped={}",
            before - selected.len()
        );
    }
    selected
}

impl EnumerationPlan {
    pub fn country_code(&self) -> u64 {
        self.country_code
    }

    /// Area codes expanded in full, ascending.
    pub fn area_codes(&self) -> &[u16] {
        &self.area_codes
    }

    /// Individually emitted numbers, ascending.
    pub fn single_numbers(&self) -> &[E164Number] {
        &self.single_numbers
    }

    pub fn total_entries(&self) -> u64 {
        self.area_codes.len() as u64 * AREA_CODE_SPAN + self.single_numbers.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.area_codes.is_empty() && self.single_numbers.is_empty()
    }

    /// Lazy ascending iterator over every entry.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            country_code: self.country_code,
            area_codes: self.area_codes.iter(),
            current: None,
            singles: self.single_numbers.iter().copied().peekable(),
        }
    }

    /// Entries grouped into vectors of at most `batch_size` (minimum 1).
    pub fn batches(&self, batch_size: usize) -> Batches<'_> {
        Batches {
            entries: self.entries(),
            batch_size: batch_size.max(1),
        }
    }

    /// Batch `index` of `batches(batch_size)`; empty once past the end.
    ///
    /// Lets a host that is torn down between batches resume by index.
    pub fn batch(&self, index: usize, batch_size: usize) -> Vec<E164Number> {
        let batch_size = batch_size.max(1);
        self.entries()
            .skip(index.saturating_mul(batch_size))
            .take(batch_size)
            .collect()
    }
}

/// Ascending merge of block ranges and single numbers.
pub struct Entries<'a> {
    country_code: u64,
    area_codes: std::slice::Iter<'a, u16>,
    current: Option<Range<E164Number>>,
    singles: Peekable<std::iter::Copied<std::slice::Iter<'a, E164Number>>>,
}

impl Entries<'_> {
    fn range_head(&mut self) -> Option<E164Number> {
        loop {
            if let Some(range) = &self.current {
                if range.start < range.end {
                    return Some(range.start);
                }
            }
            let code = *self.area_codes.next()?;
            let base = area_code_base(self.country_code, code);
            self.current = Some(base..base + AREA_CODE_SPAN);
        }
    }
}

impl Iterator for Entries<'_> {
    type Item = E164Number;

    fn next(&mut self) -> Option<Self::Item> {
        let range_head = self.range_head();
        let single_head = self.singles.peek().copied();

        match (range_head, single_head) {
            (Some(range_next), Some(single)) if single < range_next => self.singles.next(),
            (Some(range_next), Some(single)) if single == range_next => {
                self.singles.next();
                self.current.as_mut().and_then(|range| range.next())
            }
            (Some(_), _) => self.current.as_mut().and_then(|range| range.next()),
            (None, Some(_)) => self.singles.next(),
            (None, None) => None,
        }
    }
}

/// Bounded-size chunks of an `Entries` stream.
pub struct Batches<'a> {
    entries: Entries<'a>,
    batch_size: usize,
}

impl Iterator for Batches<'_> {
    type Item = Vec<E164Number>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self
            .entries
            .by_ref()
            .take(self.batch_size)
            .collect::<Vec<_>>();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}
