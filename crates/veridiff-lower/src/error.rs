//! Lowering errors

use crate::binding::Language;
use thiserror::Error;

/// Why a formula could not be lowered
///
/// All variants are fatal for the formula being lowered only; callers
/// skip the mutant and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LowerError {
    #[error("unsupported operator `{0}`")]
    UnsupportedOperator(String),

    #[error("unsupported sort {sort} for `{name}`")]
    UnsupportedSort { name: String, sort: String },

    #[error("unbound symbol `{0}`")]
    UnboundSymbol(String),

    #[error("`{op}` expects {expected} operand(s), got {actual}")]
    Arity {
        op: String,
        expected: &'static str,
        actual: usize,
    },

    /// The run's fresh identifier budget is spent
    #[error("fresh identifier limit of {limit} exhausted")]
    FreshIdExhausted { limit: usize },

    #[error("invalid lowering options: {0}")]
    InvalidOptions(String),

    #[error("{construct} cannot be expressed in {language}")]
    UnsupportedConstruct {
        construct: String,
        language: Language,
    },
}

impl LowerError {
    /// Internal resource exhaustion rather than an unsupported input
    #[must_use]
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, LowerError::FreshIdExhausted { .. })
    }
}

/// Result alias for lowering
pub type LowerResult<T> = Result<T, LowerError>;
