//! Policy persistence over the blob store.
//!
//! # Responsibility
//! - Serialize rules and numbers under their logical store keys.
//! - Hand the engine one consistent `PolicySnapshot` per invocation.
//!
//! # Invariants
//! - A missing key reads as an empty list.
//! - Individually invalid records are skipped on read, never repaired.

pub mod policy_repo;
