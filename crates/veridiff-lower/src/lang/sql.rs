//! SQL binding
//!
//! SQL has no statements, so formulas lower to a single `WHERE`
//! condition over a table whose columns are the free variables.

use crate::binding::{ConditionalForm, ImplicationForm, Language, LanguageBinding};
use crate::ir::{BinOp, NaryOp, Param, ValueType};

/// Table the generated query reads
pub const TABLE: &str = "db_table";

const RESERVED: &[&str] = &[
    "ALL", "AND", "AS", "BETWEEN", "BY", "CASE", "CAST", "DIV", "DOUBLE", "ELSE", "END",
    "EXISTS", "FALSE", "FROM", "GROUP", "IN", "INTEGER", "IS", "LIKE", "LIMIT", "MOD", "NOT",
    "NULL", "OR", "ORDER", "SELECT", "TABLE", "THEN", "TRUE", "UNION", "WHEN", "WHERE", "XOR",
    "DB_TABLE",
];

/// SQL binding
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlBinding;

impl LanguageBinding for SqlBinding {
    fn language(&self) -> Language {
        Language::Sql
    }

    fn file_extension(&self) -> &'static str {
        "sql"
    }

    fn is_reserved(&self, ident: &str) -> bool {
        let upper = ident.to_ascii_uppercase();
        RESERVED.contains(&upper.as_str())
    }

    fn type_name(&self, ty: ValueType) -> &'static str {
        match ty {
            ValueType::Bool => "BOOLEAN",
            ValueType::Int => "INTEGER",
            ValueType::Real => "DOUBLE",
        }
    }

    fn conditional_form(&self) -> ConditionalForm {
        ConditionalForm::Expression
    }

    fn implication_form(&self) -> ImplicationForm {
        ImplicationForm::Expression
    }

    fn supports_statements(&self) -> bool {
        false
    }

    fn bool_literal(&self, value: bool) -> String {
        if value { "TRUE" } else { "FALSE" }.to_string()
    }

    fn not(&self, operand: &str) -> String {
        format!("(NOT {operand})")
    }

    fn binary_glyph(&self, op: BinOp) -> &'static str {
        match op {
            BinOp::Eq => "=",
            BinOp::Ne => "<>",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Implies => "OR",
            BinOp::IntDiv => "DIV",
            BinOp::IntMod => "MOD",
            BinOp::RealDiv => "/",
        }
    }

    fn binary(&self, op: BinOp, lhs: &str, rhs: &str) -> String {
        match op {
            BinOp::Implies => format!("(NOT ({lhs}) OR ({rhs}))"),
            _ => format!("({lhs} {} {rhs})", self.binary_glyph(op)),
        }
    }

    fn nary_glyph(&self, op: NaryOp) -> &'static str {
        match op {
            NaryOp::And => "AND",
            NaryOp::Or => "OR",
            NaryOp::Xor => "XOR",
            NaryOp::Add => "+",
            NaryOp::Sub => "-",
            NaryOp::Mul => "*",
        }
    }

    fn ite(&self, cond: &str, then: &str, otherwise: &str) -> String {
        format!("(CASE WHEN {cond} THEN {then} ELSE {otherwise} END)")
    }

    fn to_real(&self, operand: &str) -> String {
        format!("CAST({operand} AS DOUBLE)")
    }

    fn routine_head(
        &self,
        _name: &str,
        _params: &[Param],
        _returns: bool,
        _ensures: Option<&str>,
    ) -> Vec<String> {
        Vec::new()
    }

    fn routine_end(&self) -> Vec<String> {
        Vec::new()
    }

    fn query(&self, condition: &str) -> String {
        format!("SELECT * FROM {TABLE} WHERE {condition}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implication_is_disjunction() {
        assert_eq!(SqlBinding.binary(BinOp::Implies, "a", "b"), "(NOT (a) OR (b))");
    }

    #[test]
    fn test_reserved_words_ignore_case() {
        assert!(SqlBinding.is_reserved("select"));
        assert!(SqlBinding.is_reserved("Mod"));
        assert!(!SqlBinding.is_reserved("x"));
    }

    #[test]
    fn test_query() {
        assert_eq!(
            SqlBinding.query("(x > 0)"),
            "SELECT * FROM db_table WHERE (x > 0)"
        );
    }
}
