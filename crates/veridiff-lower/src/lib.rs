//! veridiff-lower: SMT-LIB formulas as imperative programs
//!
//! A formula is lowered term by term into [`CodeBlock`]s of a small
//! statement IR, which a [`LanguageBinding`] renders as C, Dafny, Boogie
//! or SQL. The generated program asserts the negation of the formula, so a
//! verifier that finds a violation has found a model.
//!
//! Partial operations are made total: each distinct division term gets a
//! sentinel parameter that stands in for its value when a divisor is zero,
//! and `and`, `or` and `=>` short-circuit so later operands are only
//! evaluated when needed.
//!
//! ## Example
//!
//! ```
//! use veridiff_lower::{Language, LowerOptions, Transformer};
//! use veridiff_smt::parse_script;
//!
//! let script = parse_script("(declare-fun x () Int) (assert (> x 2)) (check-sat)").unwrap();
//! let program = Transformer::new(Language::Dafny, LowerOptions::default())
//!     .transform_script(&script)
//!     .unwrap();
//! assert!(program.source.starts_with("method check(x: int)"));
//! ```

pub mod binding;
pub mod blocks;
pub mod context;
pub mod env;
pub mod error;
pub mod inline;
pub mod ir;
pub mod lang;
pub mod lower;
pub mod options;
pub mod render;
pub mod transformer;

pub use binding::{ConditionalForm, ImplicationForm, Language, LanguageBinding};
pub use blocks::Operand;
pub use context::{normalize_identifier, BindingContext};
pub use env::LoweringEnv;
pub use error::{LowerError, LowerResult};
pub use inline::InlineLowerer;
pub use ir::{BinOp, CodeBlock, Expr, NaryOp, Param, Routine, Stmt, ValueType};
pub use lang::binding_for;
pub use lower::Lowerer;
pub use options::{LowerOptions, OracleStyle, DEFAULT_VARIABLES_LIMIT, QUANTIFIER_BOUND};
pub use render::{render_block, render_expr, render_routine};
pub use transformer::{Formula, GeneratedProgram, Transformer};
