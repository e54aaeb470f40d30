//! Policy editing service.
//!
//! # Responsibility
//! - Validate user input for area-code rules and manual number blocks.
//! - Persist each edit as a new snapshot.
//!
//! # Invariants
//! - Area codes are unique within the stored rule list.
//! - The stored rule list is kept sorted by code.
//! - Number operations never touch the rule list and vice versa.

use crate::model::area_code::{is_area_code, AreaCodeRule, RuleId};
use crate::model::blocked_number::{BlockSource, BlockedNumber, BlockedNumberId};
use crate::model::{now_epoch_ms, PolicyValidationError};
use crate::phone::normalize::{normalize, PhoneError};
use crate::repo::policy_repo::{PolicyRepository, RepoError};
use crate::store::PolicyStore;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, PolicyServiceError>;

#[derive(Debug)]
pub enum PolicyServiceError {
    Validation(PolicyValidationError),
    DuplicateAreaCode(String),
    RuleNotFound(RuleId),
    Phone(PhoneError),
    Repo(RepoError),
}

impl Display for PolicyServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateAreaCode(code) => {
                write!(f, "area code `{code}` is already in the list")
            }
            Self::RuleNotFound(id) => write!(f, "area code rule not found: {id}"),
            Self::Phone(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PolicyServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Phone(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::DuplicateAreaCode(_) | Self::RuleNotFound(_) => None,
        }
    }
}

impl From<PolicyValidationError> for PolicyServiceError {
    fn from(value: PolicyValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PhoneError> for PolicyServiceError {
    fn from(value: PhoneError) -> Self {
        Self::Phone(value)
    }
}

impl From<RepoError> for PolicyServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service for the policy editor.
pub struct PolicyService<S: PolicyStore> {
    repo: PolicyRepository<S>,
}

impl<S: PolicyStore> PolicyService<S> {
    pub fn new(repo: PolicyRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &PolicyRepository<S> {
        &self.repo
    }

    /// Rules sorted by code.
    pub fn list_area_codes(&self) -> ServiceResult<Vec<AreaCodeRule>> {
        let mut rules = self.repo.load_rules()?;
        rules.sort_by(|left, right| left.code.cmp(&right.code));
        Ok(rules)
    }

    /// Adds a new rule.
    ///
    /// # Errors
    /// - `Validation(InvalidAreaCode)` when `code` is not 3 digits.
    /// - `Validation(NoChannelSelected)` when both toggles are off.
    /// - `DuplicateAreaCode` when the code already has a rule.
    pub fn add_area_code(
        &self,
        code: &str,
        block_calls: bool,
        block_texts: bool,
    ) -> ServiceResult<AreaCodeRule> {
        let code = code.trim();
        if !is_area_code(code) {
            return Err(PolicyValidationError::InvalidAreaCode(code.to_string()).into());
        }
        if !block_calls && !block_texts {
            return Err(PolicyValidationError::NoChannelSelected.into());
        }

        let mut rules = self.repo.load_rules()?;
        if rules.iter().any(|rule| rule.code == code) {
            return Err(PolicyServiceError::DuplicateAreaCode(code.to_string()));
        }

        let rule = AreaCodeRule::new(code, block_calls, block_texts, now_epoch_ms())?;
        rules.push(rule.clone());
        self.save_sorted(rules)?;
        info!(
            "event=rule_add module=service status=ok area_code={} calls={} texts={}",
            rule.code, rule.block_calls, rule.block_texts
        );
        Ok(rule)
    }

    /// Deletes one rule.
    pub fn remove_area_code(&self, id: RuleId) -> ServiceResult<()> {
        let mut rules = self.repo.load_rules()?;
        let before = rules.len();
        rules.retain(|rule| rule.id != id);
        if rules.len() == before {
            return Err(PolicyServiceError::RuleNotFound(id));
        }
        self.save_sorted(rules)?;
        info!("event=rule_remove module=service status=ok");
        Ok(())
    }

    /// Flips call blocking for one rule and returns the updated rule.
    pub fn toggle_calls(&self, id: RuleId) -> ServiceResult<AreaCodeRule> {
        self.update_rule(id, |rule| rule.block_calls = !rule.block_calls)
    }

    /// Flips text blocking for one rule and returns the updated rule.
    pub fn toggle_texts(&self, id: RuleId) -> ServiceResult<AreaCodeRule> {
        self.update_rule(id, |rule| rule.block_texts = !rule.block_texts)
    }

    /// Sets both toggles at once.
    pub fn set_channels(
        &self,
        id: RuleId,
        block_calls: bool,
        block_texts: bool,
    ) -> ServiceResult<AreaCodeRule> {
        self.update_rule(id, |rule| {
            rule.block_calls = block_calls;
            rule.block_texts = block_texts;
        })
    }

    /// Numbers ordered most recent first.
    pub fn list_blocked_numbers(&self) -> ServiceResult<Vec<BlockedNumber>> {
        Ok(self.repo.load_snapshot()?.numbers_by_recency())
    }

    /// Blocks one number; returns the stored record and whether it is new.
    pub fn block_number(
        &self,
        raw: &str,
        source: BlockSource,
    ) -> ServiceResult<(BlockedNumber, bool)> {
        let number = normalize(raw)?;
        let (snapshot, inserted) = self
            .repo
            .load_snapshot()?
            .add_number(&number, source, now_epoch_ms());
        let Some(record) = snapshot
            .blocked_numbers
            .iter()
            .find(|existing| existing.national_number == number)
            .cloned()
        else {
            return Err(PhoneError::InvalidNumber(number.to_string()).into());
        };
        if !inserted {
            return Ok((record, false));
        }

        self.repo.save_numbers(&snapshot.blocked_numbers)?;
        info!(
            "event=number_block module=service status=ok area_code={} source={}",
            record.area_code,
            source.as_str()
        );
        Ok((record, true))
    }

    /// Removes one number; absent ids are a no-op.
    pub fn remove_blocked_number(&self, id: BlockedNumberId) -> ServiceResult<()> {
        let snapshot = self.repo.load_snapshot()?;
        let before = snapshot.blocked_numbers.len();
        let snapshot = snapshot.remove_number(id);
        if snapshot.blocked_numbers.len() != before {
            self.repo.save_numbers(&snapshot.blocked_numbers)?;
            info!("event=number_remove module=service status=ok");
        }
        Ok(())
    }

    /// Drops every individually blocked number; rules stay.
    pub fn clear_blocked_numbers(&self) -> ServiceResult<()> {
        self.repo.save_numbers(&[])?;
        info!("event=number_clear module=service status=ok");
        Ok(())
    }

    /// Drops every rule and every number in one write.
    pub fn clear_all(&self) -> ServiceResult<()> {
        self.repo.save_snapshot(&Default::default())?;
        info!("event=policy_clear module=service status=ok");
        Ok(())
    }

    fn update_rule(
        &self,
        id: RuleId,
        apply: impl FnOnce(&mut AreaCodeRule),
    ) -> ServiceResult<AreaCodeRule> {
        let mut rules = self.repo.load_rules()?;
        let rule = rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .ok_or(PolicyServiceError::RuleNotFound(id))?;
        apply(rule);
        let updated = rule.clone();
        self.save_sorted(rules)?;
        info!(
            "event=rule_update module=service status=ok area_code={} calls={} texts={}",
            updated.code, updated.block_calls, updated.block_texts
        );
        Ok(updated)
    }

    fn save_sorted(&self, mut rules: Vec<AreaCodeRule>) -> ServiceResult<()> {
        rules.sort_by(|left, right| left.code.cmp(&right.code));
        self.repo.save_rules(&rules)?;
        Ok(())
    }
}
