//! SMT-LIB sorts

use std::fmt;

/// Sort of a term or symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sort {
    Bool,
    Int,
    Real,
    /// Any other sort, kept as its SMT-LIB text (`(Array Int Int)`, `String`, ...)
    Named(String),
}

impl Sort {
    /// Map a sort symbol to a sort
    #[must_use]
    pub fn from_symbol(name: &str) -> Self {
        match name {
            "Bool" => Sort::Bool,
            "Int" => Sort::Int,
            "Real" => Sort::Real,
            other => Sort::Named(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Sort::Int | Sort::Real)
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Real => write!(f, "Real"),
            Sort::Named(name) => write!(f, "{name}"),
        }
    }
}
