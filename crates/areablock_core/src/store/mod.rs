//! Key-value blob store shared by the app and both extensions.
//!
//! # Responsibility
//! - Define the `load`/`save` contract the engine persists policy through.
//! - Provide SQLite and in-memory backends.
//!
//! # Invariants
//! - `load` returns the most recently committed `save` for a key.
//! - `save_all` commits every entry or none on backends that support it.

mod memory;
mod sqlite;

pub use memory::MemoryPolicyStore;
pub use sqlite::SqlitePolicyStore;

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store read/write failure.
#[derive(Debug)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation.
    Unavailable(String),
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "policy store unavailable: {message}"),
            Self::Db(err) => write!(f, "policy store database error: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Opaque blob store keyed by logical policy key.
pub trait PolicyStore {
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    fn save(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Writes several keys; backends with transactions override this to make
    /// the write atomic.
    fn save_all(&self, entries: &[(&str, Vec<u8>)]) -> StoreResult<()> {
        for (key, value) in entries {
            self.save(key, value)?;
        }
        Ok(())
    }
}

impl<S: PolicyStore + ?Sized> PolicyStore for &S {
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).save(key, value)
    }

    fn save_all(&self, entries: &[(&str, Vec<u8>)]) -> StoreResult<()> {
        (**self).save_all(entries)
    }
}
