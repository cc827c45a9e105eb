//! veridiff-fuzz: differential testing of program verifiers
//!
//! Each mutant formula is checked by a reference SMT solver (or compared
//! against a fixed oracle), lowered to the verifier's input language and
//! run through the verifier. Crashes and verdicts that contradict the
//! reference are written to the bugs directory as report bundles.

pub mod config;
pub mod error;
pub mod fuzzer;
pub mod report;
pub mod source;
pub mod stats;
pub mod status;

pub use config::{FuzzConfig, ToolCommands};
pub use error::{FuzzError, FuzzResult};
pub use fuzzer::{MutantOutcome, SkipReason, ToolStatus, VerifierFuzzer, MAX_TIMEOUTS};
pub use report::{BugKind, BugReport, BugReporter, ReportError, Transcript};
pub use source::{IdentitySource, ListSource, MutantSource};
pub use stats::Statistics;
pub use status::RunStatus;
