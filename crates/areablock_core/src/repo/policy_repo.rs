//! Policy repository: JSON lists under two store keys.
//!
//! # Invariants
//! - Rules round-trip as a set; numbers keep insertion order.
//! - `save_snapshot` writes both keys through one `save_all` call.

use crate::config::{AREA_CODE_RULES_KEY, BLOCKED_NUMBERS_KEY};
use crate::model::area_code::AreaCodeRule;
use crate::model::blocked_number::BlockedNumber;
use crate::model::policy::PolicySnapshot;
use crate::store::{PolicyStore, StoreError};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Store(StoreError),
    /// The blob under `key` is not a JSON array at all.
    Serialization {
        key: &'static str,
        source: serde_json::Error,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Serialization { key, source } => {
                write!(f, "invalid policy data under `{key}`: {source}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Serialization { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Reads and writes policy lists through a `PolicyStore`.
pub struct PolicyRepository<S: PolicyStore> {
    store: S,
}

impl<S: PolicyStore> PolicyRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads rules and numbers as one snapshot.
    pub fn load_snapshot(&self) -> RepoResult<PolicySnapshot> {
        Ok(PolicySnapshot::new(self.load_rules()?, self.load_numbers()?))
    }

    pub fn load_rules(&self) -> RepoResult<Vec<AreaCodeRule>> {
        self.load_list(AREA_CODE_RULES_KEY)
    }

    pub fn load_numbers(&self) -> RepoResult<Vec<BlockedNumber>> {
        self.load_list(BLOCKED_NUMBERS_KEY)
    }

    pub fn save_rules(&self, rules: &[AreaCodeRule]) -> RepoResult<()> {
        let bytes = encode(AREA_CODE_RULES_KEY, rules)?;
        self.store.save(AREA_CODE_RULES_KEY, &bytes)?;
        Ok(())
    }

    pub fn save_numbers(&self, numbers: &[BlockedNumber]) -> RepoResult<()> {
        let bytes = encode(BLOCKED_NUMBERS_KEY, numbers)?;
        self.store.save(BLOCKED_NUMBERS_KEY, &bytes)?;
        Ok(())
    }

    /// Writes both lists in one store call.
    pub fn save_snapshot(&self, snapshot: &PolicySnapshot) -> RepoResult<()> {
        let rules = encode(AREA_CODE_RULES_KEY, &snapshot.area_code_rules)?;
        let numbers = encode(BLOCKED_NUMBERS_KEY, &snapshot.blocked_numbers)?;
        self.store
            .save_all(&[(AREA_CODE_RULES_KEY, rules), (BLOCKED_NUMBERS_KEY, numbers)])?;
        Ok(())
    }

    fn load_list<T: DeserializeOwned>(&self, key: &'static str) -> RepoResult<Vec<T>> {
        let Some(bytes) = self.store.load(key)? else {
            return Ok(Vec::new());
        };
        decode_list(key, &bytes)
    }
}

fn encode<T: Serialize + ?Sized>(key: &'static str, value: &T) -> RepoResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| RepoError::Serialization { key, source })
}

fn decode_list<T: DeserializeOwned>(key: &'static str, bytes: &[u8]) -> RepoResult<Vec<T>> {
    let raw: Vec<serde_json::Value> = serde_json::from_slice(bytes)
        .map_err(|source| RepoError::Serialization { key, source })?;
    let total = raw.len();

    let items = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(
                    "event=policy_decode module=repo status=skip key={key} index={index} error={err}"
                );
                None
            }
        })
        .collect::<Vec<_>>();

    if items.len() != total {
        warn!(
            "event=policy_decode module=repo status=partial key={key} kept={} total={total}",
            items.len()
        );
    }
    Ok(items)
}
