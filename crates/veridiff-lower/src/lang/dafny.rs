//! Dafny binding

use crate::binding::{typed_params, ConditionalForm, ImplicationForm, Language, LanguageBinding};
use crate::ir::{Param, ValueType};

/// Result variable of helper methods
const RESULT: &str = "ret";

const RESERVED: &[&str] = &[
    "abstract", "array", "as", "assert", "assume", "bool", "break", "by", "calc", "case", "char",
    "class", "codatatype", "const", "constructor", "datatype", "decreases", "default", "else",
    "ensures", "exists", "expect", "false", "forall", "fresh", "function", "ghost", "if",
    "imap", "import", "in", "include", "int", "invariant", "is", "iset", "iterator", "label",
    "lemma", "map", "match", "method", "modifies", "modify", "module", "multiset", "nat",
    "new", "newtype", "null", "object", "old", "opened", "predicate", "print", "real", "reads",
    "refines", "requires", "return", "returns", "reveal", "seq", "set", "static", "string",
    "then", "this", "trait", "true", "twostate", "type", "var", "while", "witness", "yield",
    "yields",
];

/// Dafny binding
///
/// Conditionals and implications are expressions. Dafny verifies a call
/// against the callee's contract alone, so helper methods carry an
/// `ensures` clause stating the value they return.
#[derive(Debug, Clone, Copy, Default)]
pub struct DafnyBinding;

impl LanguageBinding for DafnyBinding {
    fn language(&self) -> Language {
        Language::Dafny
    }

    fn file_extension(&self) -> &'static str {
        "dfy"
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

    fn implication_form(&self) -> ImplicationForm {
        ImplicationForm::Expression
    }

    fn supports_routines(&self) -> bool {
        true
    }

    fn needs_postconditions(&self) -> bool {
        true
    }

    fn ite(&self, cond: &str, then: &str, otherwise: &str) -> String {
        format!("(if {cond} then {then} else {otherwise})")
    }

    fn to_real(&self, operand: &str) -> String {
        format!("({operand} as real)")
    }

    fn any_false(&self, operands: &[String]) -> String {
        format!("false in multiset{{{}}}", operands.join(", "))
    }

    fn declare(&self, name: &str, ty: ValueType, init: Option<&str>) -> String {
        match init {
            Some(init) => format!("var {name}: {} := {init};", self.type_name(ty)),
            None => format!("var {name}: {};", self.type_name(ty)),
        }
    }

    fn assign(&self, name: &str, value: &str) -> String {
        format!("{name} := {value};")
    }

    fn loop_head(&self, counter: &str, lo: i64, hi: i64, guard: &str) -> Vec<String> {
        vec![
            format!("var {counter}: int := {lo};"),
            format!("while {counter} <= {hi} && {guard}"),
            format!("  decreases {hi} - {counter}"),
            "{".to_string(),
        ]
    }

    fn loop_step(&self, counter: &str) -> Option<String> {
        Some(format!("{counter} := {counter} + 1;"))
    }

    fn assert(&self, cond: &str) -> String {
        format!("assert {cond};")
    }

    fn call(&self, target: &str, _ty: ValueType, routine: &str, args: &[String]) -> String {
        format!("var {target} := {routine}({});", args.join(", "))
    }

    fn routine_head(
        &self,
        name: &str,
        params: &[Param],
        returns: bool,
        ensures: Option<&str>,
    ) -> Vec<String> {
        let params = typed_params(self, params);
        if !returns {
            return vec![format!("method {name}({params})"), "{".to_string()];
        }
        // Callers rely on the postcondition alone; the body is not proved
        // against it because let-bound divisions may use other sentinels.
        let mut head = vec![format!(
            "method {{:verify false}} {name}({params}) returns ({RESULT}: bool)"
        )];
        if let Some(value) = ensures {
            head.push(format!("  ensures {RESULT} == {value}"));
        }
        head.push("{".to_string());
        head
    }

    fn routine_return(&self, result: &str) -> String {
        self.assign(RESULT, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_false_uses_multiset() {
        let ops = vec!["tmp1".to_string(), "tmp4".to_string()];
        assert_eq!(DafnyBinding.any_false(&ops), "false in multiset{tmp1, tmp4}");
    }

    #[test]
    fn test_method_head() {
        let params = vec![
            Param {
                name: "x".to_string(),
                ty: ValueType::Int,
            },
            Param {
                name: "div1".to_string(),
                ty: ValueType::Real,
            },
        ];
        assert_eq!(
            DafnyBinding.routine_head("check", &params, false, None),
            vec!["method check(x: int, div1: real)", "{"]
        );
    }

    #[test]
    fn test_helper_method_states_its_result() {
        let params = vec![Param {
            name: "x".to_string(),
            ty: ValueType::Int,
        }];
        assert_eq!(
            DafnyBinding.routine_head("formula0", &params, true, Some("(x > 0)")),
            vec![
                "method {:verify false} formula0(x: int) returns (ret: bool)",
                "  ensures ret == (x > 0)",
                "{",
            ]
        );
        assert_eq!(DafnyBinding.routine_return("tmp2"), "ret := tmp2;");
        assert!(DafnyBinding.is_reserved("ret"));
    }

    #[test]
    fn test_call_binds_a_new_local() {
        let args = vec!["x".to_string(), "div0".to_string()];
        assert_eq!(
            DafnyBinding.call("tmp5", ValueType::Bool, "formula1", &args),
            "var tmp5 := formula1(x, div0);"
        );
    }

    #[test]
    fn test_declarations() {
        assert_eq!(
            DafnyBinding.declare("tmp0", ValueType::Bool, Some("true")),
            "var tmp0: bool := true;"
        );
        assert_eq!(DafnyBinding.declare("tmp1", ValueType::Int, None), "var tmp1: int;");
    }
}
