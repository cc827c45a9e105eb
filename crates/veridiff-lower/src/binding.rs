//! Language bindings
//!
//! A binding tells the generic lowerer which constructs its target has
//! (expression-level conditionals, statements at all, helper routines)
//! and supplies the concrete syntax the renderer stitches together. The
//! default methods produce C-family syntax.

use crate::ir::{BinOp, NaryOp, Param, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported target languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Dafny,
    Boogie,
    Sql,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::C,
        Language::Dafny,
        Language::Boogie,
        Language::Sql,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Dafny => "dafny",
            Language::Boogie => "boogie",
            Language::Sql => "sql",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown language `{s}` (expected c, dafny, boogie or sql)"))
    }
}

/// How `ite`, `abs` and division guards are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalForm {
    /// Declare, then assign in both branches of an `if`
    Statement,
    /// A conditional expression
    Expression,
}

/// How `=>` is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImplicationForm {
    /// Short-circuit block of nested conditionals
    ShortCircuit,
    /// Right-nested implication operator
    Expression,
}

/// Target-language capabilities and syntax
pub trait LanguageBinding: Send + Sync {
    fn language(&self) -> Language;

    fn file_extension(&self) -> &'static str;

    /// Identifiers the target reserves; user symbols that hit one are renamed
    fn is_reserved(&self, ident: &str) -> bool;

    fn type_name(&self, ty: ValueType) -> &'static str;

    // ---- Capabilities ----

    fn conditional_form(&self) -> ConditionalForm {
        ConditionalForm::Statement
    }

    fn implication_form(&self) -> ImplicationForm {
        ImplicationForm::ShortCircuit
    }

    /// False for expression-only targets
    fn supports_statements(&self) -> bool {
        true
    }

    /// Whether helper routines can be called from the check routine
    fn supports_routines(&self) -> bool {
        false
    }

    /// Callers see a helper routine only through its postcondition
    fn needs_postconditions(&self) -> bool {
        false
    }

    /// Locals must be declared at the top of a routine
    fn hoists_declarations(&self) -> bool {
        false
    }

    // ---- Expressions ----

    fn bool_literal(&self, value: bool) -> String {
        value.to_string()
    }

    fn real_literal(&self, text: &str) -> String {
        text.to_string()
    }

    fn not(&self, operand: &str) -> String {
        format!("!{operand}")
    }

    fn neg(&self, operand: &str) -> String {
        format!("(-{operand})")
    }

    fn binary_glyph(&self, op: BinOp) -> &'static str {
        match op {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Implies => "==>",
            BinOp::IntDiv | BinOp::RealDiv => "/",
            BinOp::IntMod => "%",
        }
    }

    fn binary(&self, op: BinOp, lhs: &str, rhs: &str) -> String {
        format!("({lhs} {} {rhs})", self.binary_glyph(op))
    }

    fn nary_glyph(&self, op: NaryOp) -> &'static str {
        match op {
            NaryOp::And => "&&",
            NaryOp::Or => "||",
            NaryOp::Xor => "!=",
            NaryOp::Add => "+",
            NaryOp::Sub => "-",
            NaryOp::Mul => "*",
        }
    }

    fn ite(&self, cond: &str, then: &str, otherwise: &str) -> String {
        format!("({cond} ? {then} : {otherwise})")
    }

    fn to_real(&self, operand: &str) -> String {
        format!("((double) {operand})")
    }

    fn any_false(&self, operands: &[String]) -> String {
        let conjunction = operands.join(&format!(" {} ", self.nary_glyph(NaryOp::And)));
        self.not(&format!("({conjunction})"))
    }

    // ---- Statements ----

    fn declare(&self, name: &str, ty: ValueType, init: Option<&str>) -> String {
        match init {
            Some(init) => format!("{} {name} = {init};", self.type_name(ty)),
            None => format!("{} {name};", self.type_name(ty)),
        }
    }

    /// Declaration emitted at the top of a routine by hoisting targets
    fn hoisted_declare(&self, name: &str, ty: ValueType) -> String {
        self.declare(name, ty, None)
    }

    fn assign(&self, name: &str, value: &str) -> String {
        format!("{name} = {value};")
    }

    fn if_head(&self, cond: &str) -> String {
        format!("if ({cond}) {{")
    }

    fn else_head(&self) -> String {
        "} else {".to_string()
    }

    fn block_end(&self) -> String {
        "}".to_string()
    }

    /// Lines opening a bounded loop, ending with the line that opens its body
    fn loop_head(&self, counter: &str, lo: i64, hi: i64, guard: &str) -> Vec<String> {
        vec![format!(
            "for ({} {counter} = {lo}; {counter} <= {hi} && {guard}; {counter}++) {{",
            self.type_name(ValueType::Int)
        )]
    }

    /// Increment emitted at the end of the loop body, if the head lacks one
    fn loop_step(&self, _counter: &str) -> Option<String> {
        None
    }

    fn call(&self, target: &str, ty: ValueType, routine: &str, args: &[String]) -> String {
        format!(
            "{} {target} = {routine}({});",
            self.type_name(ty),
            args.join(", ")
        )
    }

    fn assert(&self, cond: &str) -> String {
        format!("assert({cond});")
    }

    // ---- Program shape ----

    /// Lines before any routine
    fn preamble(&self) -> Vec<String> {
        Vec::new()
    }

    /// Routine header; `returns` names the boolean result for helper
    /// routines and `ensures` is the expression that result equals
    fn routine_head(
        &self,
        name: &str,
        params: &[Param],
        returns: bool,
        ensures: Option<&str>,
    ) -> Vec<String>;

    /// Statement returning `result` from a helper routine
    fn routine_return(&self, result: &str) -> String {
        format!("return {result};")
    }

    fn routine_end(&self) -> Vec<String> {
        vec!["}".to_string()]
    }

    /// Lines after the check routine, such as a `main` wrapper
    fn entry_point(&self, _check: &str, _params: &[Param]) -> Vec<String> {
        Vec::new()
    }

    /// Whole-program form of an expression-only target
    fn query(&self, condition: &str) -> String {
        condition.to_string()
    }
}

/// Comma-separated `name: type` list used by Dafny and Boogie headers
pub(crate) fn typed_params(binding: &dyn LanguageBinding, params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{}: {}", p.name, binding.type_name(p.ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_str() {
        assert_eq!("dafny".parse::<Language>().unwrap(), Language::Dafny);
        assert_eq!("C".parse::<Language>().unwrap(), Language::C);
        assert!("rust".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_display_round_trips() {
        for language in Language::ALL {
            assert_eq!(language.to_string().parse::<Language>().unwrap(), language);
        }
    }
}
