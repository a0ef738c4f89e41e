//! Common utility functions shared across the domain and engine.
//!
//! This module provides pure helpers for reading loosely-typed host snapshots.
//!
//! # Design Principles
//!
//! - **Pure functions only** - no side effects, no I/O
//! - **Host-compatible coercion** - truthiness, `Number(x) || 0` fallbacks and
//!   string concatenation behave exactly as the host runtime does, because
//!   persisted data was written under those rules

pub mod json;

// Re-export commonly used functions at crate root for convenience
pub use json::{
    is_truthy, js_number_text, lookup, lookup_str, number_or_zero, number_value, or_default, to_js_string,
    to_number,
};
