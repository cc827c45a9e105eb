//! Lowering options

use crate::error::{LowerError, LowerResult};
use serde::{Deserialize, Serialize};

/// Default budget of fresh identifiers per formula
pub const DEFAULT_VARIABLES_LIMIT: usize = 40_000;

/// Quantified variables range over `-QUANTIFIER_BOUND..=QUANTIFIER_BOUND`.
///
/// This makes quantifier lowering an under-approximation: a `forall`
/// that fails only outside the range lowers to `true`.
pub const QUANTIFIER_BOUND: i64 = 100;

/// How the generated program states the formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OracleStyle {
    /// `assert(!(A1 && ... && An))`: a verifier reports a violation
    /// exactly when the formula is satisfiable
    #[default]
    Refutation,
    /// Each assertion is evaluated separately and the program asserts
    /// that at least one of them is false
    AnyFalse,
}

/// Options that change the generated code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LowerOptions {
    /// Treat every numeric local and literal as real
    pub real_mode: bool,
    /// Emit one routine per assertion where the target allows it
    pub method_mode: bool,
    pub oracle_style: OracleStyle,
    /// Upper bound on fresh identifiers
    pub max_fresh_ids: usize,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            real_mode: false,
            method_mode: false,
            oracle_style: OracleStyle::Refutation,
            max_fresh_ids: DEFAULT_VARIABLES_LIMIT,
        }
    }
}

impl LowerOptions {
    /// Reject settings under which no formula can be lowered
    pub fn validate(&self) -> LowerResult<()> {
        if self.max_fresh_ids == 0 {
            return Err(LowerError::InvalidOptions(
                "max_fresh_ids must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(LowerOptions::default().validate(), Ok(()));
    }

    #[test]
    fn test_zero_fresh_ids_rejected() {
        let options = LowerOptions {
            max_fresh_ids: 0,
            ..LowerOptions::default()
        };
        assert!(matches!(options.validate(), Err(LowerError::InvalidOptions(_))));
    }
}
