//! C binding
//!
//! Programs target reachability checkers such as CPAchecker and can also
//! be compiled and run. Free variables come from `__VERIFIER_nondet_*`,
//! which are defined to return zero when [`EXECUTE_MACRO`] is set so the
//! same file links into an executable. Integer `div`/`mod` go through
//! Euclidean helpers to match SMT-LIB semantics for negative operands.

use crate::binding::{Language, LanguageBinding};
use crate::ir::{BinOp, Param, ValueType};

/// Macro the compile-and-execute stage defines
pub const EXECUTE_MACRO: &str = "VERIDIFF_EXECUTE";

const RESERVED: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "bool", "true", "false", "assert", "main",
    "smt_div", "smt_mod", "NULL", "EOF",
];

const PREAMBLE: &str = "\
#include <assert.h>
#include <stdbool.h>

#ifdef VERIDIFF_EXECUTE
long __VERIFIER_nondet_long(void) { return 0; }
double __VERIFIER_nondet_double(void) { return 0.0; }
bool __VERIFIER_nondet_bool(void) { return false; }
#else
extern long __VERIFIER_nondet_long(void);
extern double __VERIFIER_nondet_double(void);
extern bool __VERIFIER_nondet_bool(void);
#endif

static long smt_div(long a, long b) {
    long q = a / b;
    if (a % b < 0) {
        q = b > 0 ? q - 1 : q + 1;
    }
    return q;
}

static long smt_mod(long a, long b) {
    long r = a % b;
    if (r < 0) {
        r = b > 0 ? r + b : r - b;
    }
    return r;
}
";

/// C binding
#[derive(Debug, Clone, Copy, Default)]
pub struct CBinding;

fn nondet(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Bool => "__VERIFIER_nondet_bool",
        ValueType::Int => "__VERIFIER_nondet_long",
        ValueType::Real => "__VERIFIER_nondet_double",
    }
}

impl LanguageBinding for CBinding {
    fn language(&self) -> Language {
        Language::C
    }

    fn file_extension(&self) -> &'static str {
        "c"
    }

    fn is_reserved(&self, ident: &str) -> bool {
        RESERVED.contains(&ident)
    }

    fn type_name(&self, ty: ValueType) -> &'static str {
        match ty {
            ValueType::Bool => "bool",
            ValueType::Int => "long",
            ValueType::Real => "double",
        }
    }

    fn supports_routines(&self) -> bool {
        true
    }

    fn binary(&self, op: BinOp, lhs: &str, rhs: &str) -> String {
        match op {
            BinOp::IntDiv => format!("smt_div({lhs}, {rhs})"),
            BinOp::IntMod => format!("smt_mod({lhs}, {rhs})"),
            BinOp::Implies => format!("(!{lhs} || {rhs})"),
            _ => format!("({lhs} {} {rhs})", self.binary_glyph(op)),
        }
    }

    fn preamble(&self) -> Vec<String> {
        PREAMBLE.lines().map(str::to_string).collect()
    }

    fn routine_head(
        &self,
        name: &str,
        params: &[Param],
        returns: bool,
        _ensures: Option<&str>,
    ) -> Vec<String> {
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params
                .iter()
                .map(|p| format!("{} {}", self.type_name(p.ty), p.name))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let head = if returns {
            format!("static bool {name}({params}) {{")
        } else {
            format!("void {name}({params}) {{")
        };
        vec![head]
    }

    fn entry_point(&self, check: &str, params: &[Param]) -> Vec<String> {
        let mut lines = vec!["int main(void) {".to_string()];
        for p in params {
            lines.push(format!(
                "    {} {} = {}();",
                self.type_name(p.ty),
                p.name,
                nondet(p.ty)
            ));
        }
        let args: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        lines.push(format!("    {check}({});", args.join(", ")));
        lines.push("    return 0;".to_string());
        lines.push("}".to_string());
        lines
    }
}
