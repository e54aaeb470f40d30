//! North-American phone number parsing.
//!
//! # Responsibility
//! - Turn arbitrary sender strings into canonical 10-digit national numbers.
//! - Derive area codes and E.164-style integers from national numbers.
//!
//! # Invariants
//! - Normalization is pure: same input, same output, no hidden state.
//! - Only 10-digit and `1`-prefixed 11-digit inputs are recognized.

pub mod normalize;
