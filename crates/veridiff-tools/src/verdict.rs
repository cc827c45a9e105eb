//! Query verdicts
//!
//! A [`CompositeVerdict`] holds one [`Verdict`] per `check-sat` query.
//! Comparison is positional and tolerant of `Unknown`.

// =============================================
// Kani Proofs for the verdict algebra
// =============================================

#[cfg(kani)]
mod kani_proofs {
    use super::*;

    fn any_verdict() -> Verdict {
        match kani::any::<u8>() % 3 {
            0 => Verdict::Sat,
            1 => Verdict::Unsat,
            _ => Verdict::Unknown,
        }
    }

    /// Verify single-verdict agreement is symmetric
    #[kani::proof]
    fn proof_verdict_agreement_symmetric() {
        let a = any_verdict();
        let b = any_verdict();
        kani::assert(
            a.agrees_with(b) == b.agrees_with(a),
            "agreement should be symmetric",
        );
    }

    /// Verify Unknown agrees with every verdict
    #[kani::proof]
    fn proof_unknown_agrees_with_all() {
        let a = any_verdict();
        kani::assert(Verdict::Unknown.agrees_with(a), "Unknown should agree");
    }

    /// Verify Sat and Unsat never agree
    #[kani::proof]
    fn proof_sat_unsat_disagree() {
        kani::assert(
            !Verdict::Sat.agrees_with(Verdict::Unsat),
            "Sat and Unsat should disagree",
        );
    }

    /// Verify composites of different lengths never agree
    #[kani::proof]
    fn proof_length_mismatch_disagrees() {
        let a = CompositeVerdict::single(any_verdict());
        let b = CompositeVerdict::from(vec![any_verdict(), any_verdict()]);
        kani::assert(!a.agrees_with(&b), "length mismatch should disagree");
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Verdict for a single satisfiability query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Sat,
    Unsat,
    Unknown,
}

impl Verdict {
    /// Equal, or either side is `Unknown`
    #[must_use]
    pub fn agrees_with(self, other: Verdict) -> bool {
        self == Verdict::Unknown || other == Verdict::Unknown || self == other
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Sat => "sat",
            Verdict::Unsat => "unsat",
            Verdict::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid verdict `{0}` (expected sat, unsat or unknown)")]
pub struct ParseVerdictError(pub String);

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sat" => Ok(Verdict::Sat),
            "unsat" => Ok(Verdict::Unsat),
            "unknown" => Ok(Verdict::Unknown),
            other => Err(ParseVerdictError(other.to_string())),
        }
    }
}

/// Ordered verdicts, one per `check-sat`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeVerdict(Vec<Verdict>);

impl CompositeVerdict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(verdict: Verdict) -> Self {
        Self(vec![verdict])
    }

    pub fn push(&mut self, verdict: Verdict) {
        self.0.push(verdict);
    }

    #[must_use]
    pub fn verdicts(&self) -> &[Verdict] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Verdict of the final query
    #[must_use]
    pub fn last(&self) -> Option<Verdict> {
        self.0.last().copied()
    }

    /// Positional, Unknown-tolerant comparison. Lengths must match.
    #[must_use]
    pub fn agrees_with(&self, other: &CompositeVerdict) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.agrees_with(*b))
    }

    /// No concrete answer to compare against
    #[must_use]
    pub fn is_inconclusive(&self) -> bool {
        self.0.iter().all(|v| *v == Verdict::Unknown)
    }
}

impl From<Vec<Verdict>> for CompositeVerdict {
    fn from(verdicts: Vec<Verdict>) -> Self {
        Self(verdicts)
    }
}

impl From<Verdict> for CompositeVerdict {
    fn from(verdict: Verdict) -> Self {
        Self::single(verdict)
    }
}

impl fmt::Display for CompositeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, verdict) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{verdict}")?;
        }
        Ok(())
    }
}

/// Accepts `sat`, or a comma separated list such as `sat,unsat,unknown`
impl FromStr for CompositeVerdict {
    type Err = ParseVerdictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
