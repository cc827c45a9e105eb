//! veridiff-tools: external solvers, verifiers and compilers
//!
//! Every tool is run through [`run_command`], which bounds the process by
//! a wall-clock timeout and kills it on expiry. The captured [`ToolRun`]
//! is mapped to an [`Outcome`] in one place, and tool families read their
//! answers from the output:
//!
//! - [`Solver`]: the reference SMT solver, one verdict per `check-sat`
//! - [`Dafny`], [`Boogie`], [`Cpachecker`]: secondary verifiers
//! - [`Compiler`]: compiles generated C and executes the binary

pub mod boogie;
pub mod compiler;
pub mod cpachecker;
pub mod dafny;
pub mod error;
pub mod outcome;
pub mod process;
pub mod solver;
pub mod tool;
pub mod verdict;

pub use boogie::Boogie;
pub use compiler::{Compiler, EXECUTE_DEFINE};
pub use cpachecker::{Cpachecker, CpacheckerConfig};
pub use dafny::Dafny;
pub use error::{ToolError, ToolResult};
pub use outcome::{aborted, Outcome};
pub use process::{run_command, split_command, ToolRun, NOT_FOUND_CODE, TIMEOUT_CODE};
pub use solver::{Solver, SolverAnswer, DEFAULT_IGNORE_LIST};
pub use tool::{Tool, UnparsableOutput, Verifier};
pub use verdict::{CompositeVerdict, ParseVerdictError, Verdict};
