//! Run statistics

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// Counters for one fuzzing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub seeds: usize,
    /// Seeds that failed to parse or typecheck
    pub skipped_seeds: usize,
    pub mutants: usize,
    /// Mutants the reference solver rejected or gave no result for
    pub invalid_mutants: usize,
    /// Mutants that failed re-validation or lowering
    pub unsupported: usize,
    /// Secondary tool invocations
    pub solver_calls: usize,
    /// Invocations that produced an answer or a finding
    pub effective_calls: usize,
    pub timeouts: usize,
    pub crashes: usize,
    pub soundness: usize,
    #[serde(skip)]
    started: Option<Instant>,
}

impl Statistics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Some(Instant::now()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn findings(&self) -> usize {
        self.crashes + self.soundness
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.map(|t| t.elapsed()).unwrap_or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed().as_secs_f64();
        let rate = if secs > 0.0 {
            self.solver_calls as f64 / secs
        } else {
            0.0
        };
        let effective = if self.solver_calls > 0 {
            100.0 * self.effective_calls as f64 / self.solver_calls as f64
        } else {
            0.0
        };
        writeln!(
            f,
            "Performed {} solver calls ({rate:.1} calls/s, {effective:.1}% effective)",
            self.solver_calls
        )?;
        writeln!(
            f,
            "Seeds: {} tested, {} skipped; mutants: {} tested, {} invalid, {} unsupported",
            self.seeds, self.skipped_seeds, self.mutants, self.invalid_mutants, self.unsupported
        )?;
        write!(
            f,
            "Timeouts: {}, crashes: {}, soundness bugs: {}",
            self.timeouts, self.crashes, self.soundness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_counts() {
        let stats = Statistics {
            solver_calls: 4,
            effective_calls: 3,
            crashes: 1,
            soundness: 2,
            ..Statistics::new()
        };
        assert_eq!(stats.findings(), 3);
        let text = stats.to_string();
        assert!(text.contains("Performed 4 solver calls"));
        assert!(text.contains("75.0% effective"));
        assert!(text.contains("crashes: 1, soundness bugs: 2"));
    }

    #[test]
    fn test_json_omits_clock() {
        let json = Statistics::new().to_json().unwrap();
        assert!(json.contains("\"soundness\": 0"));
        assert!(!json.contains("started"));
    }
}
