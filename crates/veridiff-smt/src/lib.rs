//! veridiff-smt: SMT-LIB terms for translation validation
//!
//! This crate reads the SMT-LIB fragment that the lowering understands
//! (Booleans, linear and non-linear integer/real arithmetic, quantifiers,
//! `let` and named terms) and re-validates mutants before they are
//! translated.
//!
//! ## Example
//!
//! ```
//! use veridiff_smt::{parse_script, check_script, Sort};
//!
//! let script = parse_script("(declare-fun x () Int) (assert (> x 0)) (check-sat)").unwrap();
//! check_script(&script).unwrap();
//! assert_eq!(script.free_vars()["x"], Sort::Int);
//! ```

pub mod error;
pub mod lexer;
pub mod parse;
pub mod script;
pub mod sexp;
pub mod sort;
pub mod term;
pub mod typecheck;

pub use error::{SmtError, SmtResult};
pub use parse::{parse_script, parse_term};
pub use script::{Command, Script};
pub use sort::Sort;
pub use term::{Quantifier, Term};
pub use typecheck::{check_script, check_term};

/// Parse and sort-check `input` in one step
pub fn revalidate(input: &str) -> SmtResult<Script> {
    let script = parse_script(input)?;
    check_script(&script)?;
    Ok(script)
}
