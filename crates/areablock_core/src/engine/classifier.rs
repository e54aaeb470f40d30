//! Message-filter classifier.
//!
//! # Responsibility
//! - Decide allow/junk for one inbound sender against text-blocking rules.
//! - Record blocked senders as individually blocked numbers.
//!
//! # Invariants
//! - Missing, empty or unparseable senders are always allowed.
//! - Store failures never turn an allow into a block.
//! - A failed record write never changes a junk decision.

use crate::engine::cache::ClassificationCache;
use crate::model::blocked_number::BlockSource;
use crate::phone::normalize::{normalize, NationalNumber};
use crate::repo::policy_repo::{PolicyRepository, RepoResult};
use crate::store::PolicyStore;
use log::{debug, info, warn};
use std::collections::BTreeSet;

/// Action reported back to the message-filter host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Allow,
    Junk,
}

impl FilterAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Junk => "junk",
        }
    }
}

/// Side effect requested by a block decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordNumber {
    pub number: NationalNumber,
}

/// Outcome of classifying one sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Allow,
    Block(RecordNumber),
}

impl Classification {
    pub fn action(&self) -> FilterAction {
        match self {
            Self::Allow => FilterAction::Allow,
            Self::Block(_) => FilterAction::Junk,
        }
    }
}

/// Classifies `sender` against a resolved set of text-blocked area codes.
pub fn classify_sender(sender: Option<&str>, blocked_codes: &BTreeSet<String>) -> Classification {
    let Some(raw) = sender.filter(|raw| !raw.trim().is_empty()) else {
        return Classification::Allow;
    };
    let Ok(number) = normalize(raw) else {
        return Classification::Allow;
    };
    if blocked_codes.contains(number.area_code()) {
        Classification::Block(RecordNumber { number })
    } else {
        Classification::Allow
    }
}

/// Request-scoped classifier bound to a long-lived cache.
pub struct MessageClassifier<'c, S: PolicyStore> {
    repo: PolicyRepository<S>,
    cache: &'c mut ClassificationCache,
}

impl<'c, S: PolicyStore> MessageClassifier<'c, S> {
    pub fn new(repo: PolicyRepository<S>, cache: &'c mut ClassificationCache) -> Self {
        Self { repo, cache }
    }

    /// Classifies `sender` using the cached text-blocked codes at `now_ms`.
    pub fn classify(&mut self, sender: Option<&str>, now_ms: i64) -> Classification {
        let repo = &self.repo;
        let blocked_codes = self.cache.get(now_ms, || {
            repo.load_rules()
                .map(|rules| {
                    rules
                        .into_iter()
                        .filter(|rule| rule.block_texts)
                        .map(|rule| rule.code)
                        .collect::<BTreeSet<_>>()
                })
                .map_err(|err| {
                    warn!(
                        "event=classify module=engine status=degraded error_code=store_unavailable error={err}"
                    );
                    err
                })
        });
        classify_sender(sender, &blocked_codes)
    }

    /// Classifies `sender` and records it when blocked.
    pub fn handle(&mut self, sender: Option<&str>, now_ms: i64) -> FilterAction {
        let classification = self.classify(sender, now_ms);
        match &classification {
            Classification::Allow => {
                debug!("event=classify module=engine status=ok action=allow");
            }
            Classification::Block(record) => {
                info!(
                    "event=classify module=engine status=ok action=junk area_code={}",
                    record.number.area_code()
                );
                if let Err(err) = self.record(record, now_ms) {
                    warn!(
                        "event=record_number module=engine status=error error_code=side_effect_write_failed area_code={} error={err}",
                        record.number.area_code()
                    );
                }
            }
        }
        classification.action()
    }

    /// Appends the blocked sender to the stored number list.
    ///
    /// Only the numbers key is rewritten. Returns whether a record was added.
    pub fn record(&self, record: &RecordNumber, now_ms: i64) -> RepoResult<bool> {
        let snapshot = self.repo.load_snapshot()?;
        let (snapshot, inserted) = snapshot.add_number(&record.number, BlockSource::Text, now_ms);
        if inserted {
            self.repo.save_numbers(&snapshot.blocked_numbers)?;
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_sender, Classification, FilterAction};
    use std::collections::BTreeSet;

    fn codes(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn absent_and_blank_senders_are_allowed() {
        let blocked = codes(&["206"]);
        assert_eq!(classify_sender(None, &blocked), Classification::Allow);
        assert_eq!(classify_sender(Some(""), &blocked), Classification::Allow);
        assert_eq!(classify_sender(Some("   "), &blocked), Classification::Allow);
    }

    #[test]
    fn short_codes_and_emails_are_allowed() {
        let blocked = codes(&["206"]);
        assert_eq!(classify_sender(Some("20655"), &blocked), Classification::Allow);
        assert_eq!(
            classify_sender(Some("someone@example.com"), &blocked),
            Classification::Allow
        );
    }

    #[test]
    fn matching_area_code_blocks_with_record() {
        let blocked = codes(&["206"]);
        let outcome = classify_sender(Some("+1 (206) 555-1234"), &blocked);
        assert_eq!(outcome.action(), FilterAction::Junk);
        let Classification::Block(record) = outcome else {
            panic!("expected block");
        };
        assert_eq!(record.number.as_str(), "2065551234");
    }
}
