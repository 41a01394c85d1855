//! Data validation engine.
//!
//! Provides input classification, rule parsing, a rule evaluator with
//! injected presence/URL capabilities, message formatting and the aggregated
//! validation result.

pub mod evaluator;
pub mod files;
pub mod formats;
pub mod input;
pub mod lookup;
pub mod messages;
pub mod network;
pub mod result;
pub mod rules;
