//! Form and file validation engine.
//!
//! Rule strings such as `"required|numeric|between:1,2"` are parsed once into
//! a [`validation::rules::RuleSet`], then evaluated against an
//! [`validation::input::Input`] by a [`validation::evaluator::Validator`].
//! Database and network checks go through injected capabilities so the rest
//! of the engine stays pure.

pub mod config;
pub mod error;
pub mod validation;
