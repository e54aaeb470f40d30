//! Policy editing use-cases.
//!
//! # Responsibility
//! - Give the app UI add/remove/toggle/clear entry points over the store.
//! - Keep UI and FFI layers decoupled from serialization details.

pub mod policy_service;
