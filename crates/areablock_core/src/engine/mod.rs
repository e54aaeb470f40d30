//! Blocking-rule resolution engine.
//!
//! # Responsibility
//! - Expand call-blocking rules into the strictly ascending number stream the
//!   call-directory host accepts.
//! - Classify inbound message senders against text-blocking rules.
//!
//! # Invariants
//! - Every invocation reads one snapshot up front and performs no I/O while
//!   enumerating.
//! - Failures degrade to allowing traffic, never to blocking it.

pub mod cache;
pub mod call_directory;
pub mod classifier;
pub mod enumerator;
