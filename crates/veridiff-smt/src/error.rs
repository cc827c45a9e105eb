//! Error types for SMT-LIB reading and sort checking

use thiserror::Error;

/// Errors produced while reading or checking an SMT-LIB script
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmtError {
    /// Malformed s-expression input
    #[error("parse error{}: {message}", position.map(|p| format!(" at byte {p}")).unwrap_or_default())]
    Parse {
        message: String,
        position: Option<usize>,
    },

    /// A symbol that is neither declared nor bound
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),

    /// Well-formed SMT-LIB outside the supported fragment
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// Operator applied to the wrong number of arguments
    #[error("`{op}` expects {expected} argument(s), got {actual}")]
    Arity {
        op: String,
        expected: &'static str,
        actual: usize,
    },

    /// Ill-sorted term
    #[error("sort error in `{term}`: {message}")]
    Sort { term: String, message: String },
}

impl SmtError {
    pub(crate) fn parse(message: impl Into<String>, position: Option<usize>) -> Self {
        SmtError::Parse {
            message: message.into(),
            position,
        }
    }
}

/// Result alias for this crate
pub type SmtResult<T> = Result<T, SmtError>;
