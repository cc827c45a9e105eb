//! Reference SMT solver

use crate::process::ToolRun;
use crate::tool::Tool;
use crate::verdict::{CompositeVerdict, Verdict};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    /// One verdict line per `check-sat`
    static ref RE_RESULT_LINE: Regex = Regex::new(r"^(sat|unsat|unknown|timeout)\r?$")
        .expect("RE_RESULT_LINE regex is valid");
}

/// Output fragments by which solvers report their own internal failures
pub const DEFAULT_IGNORE_LIST: &[&str] = &[
    "Exception",
    "lang.AssertionError",
    "lang.Error",
    "runtime error",
    "LEAKED",
    "Leaked",
    "Segmentation fault",
    "segmentation fault",
    "segfault",
    "ASSERTION",
    "Assertion",
    "Fatal failure",
    "Internal error detected",
    "an invalid model was generated",
    "Failed to verify",
    "failed to verify",
    "ERROR: AddressSanitizer:",
    "invalid expression",
    "Aborted",
];

/// What a solver run says about the formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverAnswer {
    /// The solver reported an internal problem; the entry that matched
    SelfReportedError(String),
    /// No `sat`/`unsat`/`unknown` line at all
    NoResult,
    Verdict(CompositeVerdict),
}

/// The reference solver
#[derive(Debug, Clone)]
pub struct Solver {
    cli: String,
    ignore_list: Vec<String>,
}

impl Solver {
    pub fn new(cli: impl Into<String>) -> Self {
        Self::with_ignore_list(
            cli,
            DEFAULT_IGNORE_LIST.iter().map(|s| s.to_string()).collect(),
        )
    }

    pub fn with_ignore_list(cli: impl Into<String>, ignore_list: Vec<String>) -> Self {
        Self {
            cli: cli.into(),
            ignore_list,
        }
    }

    /// Classify the output of a completed run
    pub fn analyze(&self, run: &ToolRun) -> SolverAnswer {
        if let Some(hit) = self
            .ignore_list
            .iter()
            .find(|entry| run.stdout.contains(entry.as_str()) || run.stderr.contains(entry.as_str()))
        {
            warn!(solver = %self.cli, entry = %hit, "solver reported an internal error");
            return SolverAnswer::SelfReportedError(hit.clone());
        }
        match extract_composite(&run.stdout) {
            Some(verdict) => {
                debug!(solver = %self.cli, %verdict, "solver verdict");
                SolverAnswer::Verdict(verdict)
            }
            None => SolverAnswer::NoResult,
        }
    }
}

impl Tool for Solver {
    fn name(&self) -> &'static str {
        "solver"
    }

    fn cli(&self) -> &str {
        &self.cli
    }
}

/// Collect verdict lines in order. `timeout` lines count as unknown.
///
/// Returns `None` when the output has no `sat`, `unsat` or `unknown` line.
pub fn extract_composite(stdout: &str) -> Option<CompositeVerdict> {
    let mut verdict = CompositeVerdict::new();
    let mut answered = false;
    for line in stdout.lines() {
        let Some(caps) = RE_RESULT_LINE.captures(line) else {
            continue;
        };
        let v = match &caps[1] {
            "sat" => Verdict::Sat,
            "unsat" => Verdict::Unsat,
            _ => Verdict::Unknown,
        };
        answered |= &caps[1] != "timeout";
        verdict.push(v);
    }
    answered.then_some(verdict)
}
