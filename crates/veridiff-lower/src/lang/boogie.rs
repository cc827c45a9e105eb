//! Boogie binding

use crate::binding::{typed_params, ConditionalForm, Language, LanguageBinding};
use crate::ir::{BinOp, Param, ValueType};

const RESERVED: &[&str] = &[
    "assert", "assume", "axiom", "bool", "break", "call", "complete", "const", "div", "else",
    "ensures", "exists", "false", "finite", "forall", "free", "function", "goto", "havoc", "if",
    "implementation", "int", "invariant", "lambda", "mod", "modifies", "old", "procedure",
    "real", "requires", "return", "returns", "then", "true", "type", "unique", "var", "where",
    "while",
];

/// Name of the out-parameter of helper procedures
const RESULT: &str = "ret";

/// Boogie binding
///
/// Locals are hoisted to `var` declarations at the top of each procedure.
/// Helper procedures are `{:inline 1}` so callers see their bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoogieBinding;

impl LanguageBinding for BoogieBinding {
    fn language(&self) -> Language {
        Language::Boogie
    }

    fn file_extension(&self) -> &'static str {
        "bpl"
    }

    fn is_reserved(&self, ident: &str) -> bool {
        ident == RESULT || RESERVED.contains(&ident)
    }

    fn type_name(&self, ty: ValueType) -> &'static str {
        match ty {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Real => "real",
        }
    }

    fn conditional_form(&self) -> ConditionalForm {
        ConditionalForm::Expression
    }

    fn supports_routines(&self) -> bool {
        true
    }

    fn hoists_declarations(&self) -> bool {
        true
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
            BinOp::IntDiv => "div",
            BinOp::IntMod => "mod",
            BinOp::RealDiv => "/",
        }
    }

    fn ite(&self, cond: &str, then: &str, otherwise: &str) -> String {
        format!("(if {cond} then {then} else {otherwise})")
    }

    fn to_real(&self, operand: &str) -> String {
        format!("real({operand})")
    }

    fn declare(&self, name: &str, ty: ValueType, init: Option<&str>) -> String {
        match init {
            Some(init) => self.assign(name, init),
            None => self.hoisted_declare(name, ty),
        }
    }

    fn hoisted_declare(&self, name: &str, ty: ValueType) -> String {
        format!("var {name}: {};", self.type_name(ty))
    }

    fn assign(&self, name: &str, value: &str) -> String {
        format!("{name} := {value};")
    }

    fn loop_head(&self, counter: &str, lo: i64, hi: i64, guard: &str) -> Vec<String> {
        vec![
            format!("{counter} := {lo};"),
            format!("while ({counter} <= {hi} && {guard}) {{"),
        ]
    }

    fn loop_step(&self, counter: &str) -> Option<String> {
        Some(format!("{counter} := {counter} + 1;"))
    }

    fn call(&self, target: &str, _ty: ValueType, routine: &str, args: &[String]) -> String {
        format!("call {target} := {routine}({});", args.join(", "))
    }

    fn assert(&self, cond: &str) -> String {
        format!("assert {cond};")
    }

    fn routine_head(
        &self,
        name: &str,
        params: &[Param],
        returns: bool,
        _ensures: Option<&str>,
    ) -> Vec<String> {
        let params = typed_params(self, params);
        let head = if returns {
            format!("procedure {{:inline 1}} {name}({params}) returns ({RESULT}: bool)")
        } else {
            format!("procedure {name}({params})")
        };
        vec![head, "{".to_string()]
    }

    fn routine_return(&self, result: &str) -> String {
        self.assign(RESULT, result)
    }
}
