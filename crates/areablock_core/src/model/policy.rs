//! Immutable policy snapshot and rule-resolution accessors.
//!
//! # Responsibility
//! - Pair the area-code rules with the individually blocked numbers read at
//!   the start of one engine invocation.
//! - Resolve which area codes block calls/texts and which numbers are covered.
//!
//! # Invariants
//! - Accessors never mutate; `add_number`/`remove_number` consume and return.
//! - `add_number` is idempotent on the normalized national number.

use crate::model::area_code::{AreaCodeRule, RuleId};
use crate::model::blocked_number::{BlockSource, BlockedNumber, BlockedNumberId};
use crate::phone::normalize::NationalNumber;
use std::collections::BTreeSet;

/// Rules and numbers as read from the store for one engine cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySnapshot {
    /// Input order is preserved; the enumerator sorts its own copy.
    pub area_code_rules: Vec<AreaCodeRule>,
    /// Insertion order, oldest first.
    pub blocked_numbers: Vec<BlockedNumber>,
}

impl PolicySnapshot {
    pub fn new(area_code_rules: Vec<AreaCodeRule>, blocked_numbers: Vec<BlockedNumber>) -> Self {
        Self {
            area_code_rules,
            blocked_numbers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.area_code_rules.is_empty() && self.blocked_numbers.is_empty()
    }

    /// Codes with `block_calls == true`.
    pub fn call_blocked_area_codes(&self) -> BTreeSet<String> {
        self.area_code_rules
            .iter()
            .filter(|rule| rule.block_calls)
            .map(|rule| rule.code.clone())
            .collect()
    }

    /// Codes with `block_texts == true`.
    pub fn text_blocked_area_codes(&self) -> BTreeSet<String> {
        self.area_code_rules
            .iter()
            .filter(|rule| rule.block_texts)
            .map(|rule| rule.code.clone())
            .collect()
    }

    /// Whether an area-code rule already blocks calls from `number`.
    pub fn is_number_call_eligible(&self, number: &BlockedNumber) -> bool {
        self.area_code_rules
            .iter()
            .any(|rule| rule.block_calls && rule.code == number.area_code)
    }

    /// Whether an area-code rule already blocks texts from `number`.
    pub fn is_number_text_eligible(&self, number: &BlockedNumber) -> bool {
        self.area_code_rules
            .iter()
            .any(|rule| rule.block_texts && rule.code == number.area_code)
    }

    pub fn rule(&self, id: RuleId) -> Option<&AreaCodeRule> {
        self.area_code_rules.iter().find(|rule| rule.id == id)
    }

    /// First rule for `code` in input order.
    pub fn rule_for_code(&self, code: &str) -> Option<&AreaCodeRule> {
        self.area_code_rules.iter().find(|rule| rule.code == code)
    }

    pub fn contains_number(&self, number: &NationalNumber) -> bool {
        self.blocked_numbers
            .iter()
            .any(|existing| &existing.national_number == number)
    }

    /// Appends `number` unless the same national number is already present.
    ///
    /// Returns the resulting snapshot and whether a record was inserted.
    pub fn add_number(
        mut self,
        number: &NationalNumber,
        source: BlockSource,
        blocked_at: i64,
    ) -> (Self, bool) {
        if self.contains_number(number) {
            return (self, false);
        }
        self.blocked_numbers
            .push(BlockedNumber::new(number.clone(), source, blocked_at));
        (self, true)
    }

    /// Removes the number with `id`; absent ids are a no-op.
    pub fn remove_number(mut self, id: BlockedNumberId) -> Self {
        self.blocked_numbers.retain(|number| number.id != id);
        self
    }

    /// Numbers ordered most recent first; ties keep insertion order reversed.
    pub fn numbers_by_recency(&self) -> Vec<BlockedNumber> {
        let mut numbers = self.blocked_numbers.clone();
        numbers.reverse();
        numbers.sort_by(|left, right| right.blocked_at.cmp(&left.blocked_at));
        numbers
    }
}

#[cfg(test)]
mod tests {
    use super::PolicySnapshot;
    use crate::model::area_code::AreaCodeRule;
    use crate::model::blocked_number::{BlockSource, BlockedNumber};
    use crate::phone::normalize::{normalize, NationalNumber};

    fn rule(code: &str, calls: bool, texts: bool) -> AreaCodeRule {
        AreaCodeRule::new(code, calls, texts, 0).unwrap()
    }

    #[test]
    fn channel_sets_follow_toggles() {
        let snapshot = PolicySnapshot::new(
            vec![rule("206", true, false), rule("415", false, true), rule("212", true, true)],
            Vec::new(),
        );

        let calls: Vec<_> = snapshot.call_blocked_area_codes().into_iter().collect();
        let texts: Vec<_> = snapshot.text_blocked_area_codes().into_iter().collect();
        assert_eq!(calls, vec!["206", "212"]);
        assert_eq!(texts, vec!["212", "415"]);
    }

    #[test]
    fn eligibility_uses_area_code_membership() {
        let snapshot = PolicySnapshot::new(vec![rule("206", true, false)], Vec::new());
        let covered = BlockedNumber::new(normalize("2065550100").unwrap(), BlockSource::Manual, 1);
        let other = BlockedNumber::new(normalize("3125550100").unwrap(), BlockSource::Manual, 1);

        assert!(snapshot.is_number_call_eligible(&covered));
        assert!(!snapshot.is_number_text_eligible(&covered));
        assert!(!snapshot.is_number_call_eligible(&other));
    }

    #[test]
    fn add_number_is_idempotent() {
        let number = NationalNumber::from_digits("2065551234").unwrap();
        let (snapshot, inserted) =
            PolicySnapshot::default().add_number(&number, BlockSource::Text, 10);
        assert!(inserted);

        let (snapshot, inserted_again) = snapshot.add_number(&number, BlockSource::Manual, 20);
        assert!(!inserted_again);
        assert_eq!(snapshot.blocked_numbers.len(), 1);
        assert_eq!(snapshot.blocked_numbers[0].source, BlockSource::Text);
        assert_eq!(snapshot.blocked_numbers[0].area_code, "206");
    }

    #[test]
    fn remove_number_ignores_unknown_id() {
        let number = NationalNumber::from_digits("2065551234").unwrap();
        let (snapshot, _) = PolicySnapshot::default().add_number(&number, BlockSource::Text, 10);
        let id = snapshot.blocked_numbers[0].id;

        let unchanged = snapshot.clone().remove_number(uuid::Uuid::new_v4());
        assert_eq!(unchanged, snapshot);

        let removed = snapshot.remove_number(id);
        assert!(removed.blocked_numbers.is_empty());
    }

    #[test]
    fn numbers_by_recency_puts_newest_first() {
        let first = NationalNumber::from_digits("2065550001").unwrap();
        let second = NationalNumber::from_digits("2065550002").unwrap();
        let (snapshot, _) = PolicySnapshot::default().add_number(&first, BlockSource::Text, 100);
        let (snapshot, _) = snapshot.add_number(&second, BlockSource::Text, 200);

        let ordered = snapshot.numbers_by_recency();
        assert_eq!(ordered[0].national_number, second);
        assert_eq!(ordered[1].national_number, first);
    }
}
