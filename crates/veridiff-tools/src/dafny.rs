//! Dafny program verifier
//!
//! Besides the fixed options every run picks one flag from each option
//! pool at random, so the verifier's own configuration space is fuzzed
//! alongside the formula.

use crate::outcome::Outcome;
use crate::process::{split_command, ToolRun};
use crate::tool::{match_banner, Tool, UnparsableOutput, Verifier};
use crate::verdict::Verdict;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::path::Path;

/// Dafny's exit code for "verification errors found"
const VERIFICATION_ERRORS: i32 = 4;

/// Options passed on every run
pub const FIXED_OPTIONS: &[&str] = &[
    "/compile:0",
    "/proverOpt:O:timeout=40",
    "/proverOpt:O:memory_max_size=10000",
    "/timeLimit:40",
    "/rlimit:10000",
    "/printVerifiedProceduresCount:0",
    "/proverOpt:O:smt.arith.solver=6",
];

/// One flag is drawn from each pool per run
pub const OPTION_POOLS: &[&[&str]] = &[
    &["/noCheating:0", "/noCheating:1"],
    &[
        "/induction:0",
        "/induction:1",
        "/induction:2",
        "/induction:3",
        "/induction:4",
    ],
    &[
        "/inductionHeuristic:0",
        "/inductionHeuristic:1",
        "/inductionHeuristic:2",
        "/inductionHeuristic:3",
        "/inductionHeuristic:4",
        "/inductionHeuristic:5",
        "/inductionHeuristic:6",
    ],
    &["/definiteAssignment:1", "/definiteAssignment:4"],
    &[
        "/arith:0", "/arith:1", "/arith:2", "/arith:3", "/arith:4", "/arith:5", "/arith:6",
        "/arith:7", "/arith:8", "/arith:9", "/arith:10",
    ],
    &["/rewriteFocalPredicates:0", "/rewriteFocalPredicates:1"],
];

const BANNERS: &[(&str, Verdict)] = &[
    ("assertion might not hold", Verdict::Sat),
    ("getting info about 'unknown' response", Verdict::Unknown),
    ("out of resource", Verdict::Unknown),
    ("0 error", Verdict::Unsat),
];

/// Failing runs with this output are not findings
const BENIGN_ERRORS: &[&str] = &["Program compiled successfully", "Duplicate local-variable"];

/// Dafny verifier wrapper
#[derive(Debug, Clone)]
pub struct Dafny {
    cli: String,
    randomize: bool,
}

impl Dafny {
    pub fn new(cli: impl Into<String>) -> Self {
        Self {
            cli: cli.into(),
            randomize: true,
        }
    }

    /// Disable the random option pools (fixed options only)
    #[must_use]
    pub fn with_randomized_options(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// `dafny <file> <user args> <fixed options> <random picks>`
    pub fn command_line_with<R: Rng + ?Sized>(&self, file: &Path, rng: &mut R) -> Vec<String> {
        let mut parts = split_command(&self.cli).into_iter();
        let Some(program) = parts.next() else {
            return Vec::new();
        };
        let mut argv = vec![program, file.display().to_string()];
        argv.extend(parts);
        argv.extend(FIXED_OPTIONS.iter().map(|s| s.to_string()));
        if self.randomize {
            argv.extend(
                OPTION_POOLS
                    .iter()
                    .filter_map(|pool| pool.choose(rng))
                    .map(|s| s.to_string()),
            );
        }
        argv
    }
}

impl Tool for Dafny {
    fn name(&self) -> &'static str {
        "dafny"
    }

    fn cli(&self) -> &str {
        &self.cli
    }

    fn command_line(&self, file: &Path) -> Vec<String> {
        self.command_line_with(file, &mut rand::rng())
    }

    fn classify(&self, run: &ToolRun) -> Outcome {
        if !run.timed_out && run.returncode == VERIFICATION_ERRORS {
            Outcome::Ok
        } else {
            Outcome::classify(run)
        }
    }
}

impl Verifier for Dafny {
    fn extract_verdict(&self, run: &ToolRun) -> Result<Verdict, UnparsableOutput> {
        match_banner(&run.stdout, BANNERS)
    }

    fn is_benign_error(&self, run: &ToolRun) -> bool {
        BENIGN_ERRORS.iter().any(|banner| run.stdout.contains(banner))
    }
}
