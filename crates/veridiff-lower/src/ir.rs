//! Target-independent statement and expression IR
//!
//! The lowerer produces this IR; language bindings only render it. Every
//! identifier that appears in an expression is either a routine parameter
//! or was declared by an earlier statement in the same or an enclosing
//! block.

/// Value type of a generated local or parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Real,
}

impl ValueType {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Real)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Implies,
    /// Euclidean integer division
    IntDiv,
    /// Euclidean remainder, always non-negative
    IntMod,
    RealDiv,
}

impl BinOp {
    /// Map an SMT-LIB comparison operator
    #[must_use]
    pub fn comparison(op: &str) -> Option<BinOp> {
        match op {
            "=" => Some(BinOp::Eq),
            "distinct" => Some(BinOp::Ne),
            "<" => Some(BinOp::Lt),
            "<=" => Some(BinOp::Le),
            ">" => Some(BinOp::Gt),
            ">=" => Some(BinOp::Ge),
            _ => None,
        }
    }
}

/// Left-associative n-ary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaryOp {
    And,
    Or,
    Xor,
    Add,
    Sub,
    Mul,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Bool(bool),
    /// Non-negative integer literal
    Int(String),
    /// Decimal literal, always with a fractional part
    Real(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Nary(NaryOp, Vec<Expr>),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
    ToReal(Box<Expr>),
    /// True when at least one operand is false
    AnyFalse(Vec<Expr>),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }

    #[must_use]
    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    #[must_use]
    pub fn ite(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Ite(Box::new(cond), Box::new(then), Box::new(otherwise))
    }

    /// Zero literal of a numeric type
    #[must_use]
    pub fn zero(ty: ValueType) -> Self {
        match ty {
            ValueType::Real => Expr::Real("0.0".to_string()),
            _ => Expr::Int("0".to_string()),
        }
    }

    /// Conjunction that collapses the trivial cases
    #[must_use]
    pub fn and_all(mut operands: Vec<Expr>) -> Self {
        match operands.len() {
            0 => Expr::Bool(true),
            1 => operands.remove(0),
            _ => Expr::Nary(NaryOp::And, operands),
        }
    }

    /// Convert `self`, of type `from`, to type `to`
    #[must_use]
    pub fn coerce(self, from: ValueType, to: ValueType) -> Self {
        if from == ValueType::Int && to == ValueType::Real {
            Expr::ToReal(Box::new(self))
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Declare {
        name: String,
        ty: ValueType,
        init: Option<Expr>,
    },
    Assign {
        name: String,
        value: Expr,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    /// Runs `body` for `counter` in `lo..=hi` while `guard` holds.
    /// The loop owns the declaration of the integer `counter`.
    BoundedLoop {
        counter: String,
        lo: i64,
        hi: i64,
        guard: Expr,
        body: Vec<Stmt>,
    },
    /// Declares `target` and stores the result of calling `routine`
    Call {
        target: String,
        ty: ValueType,
        routine: String,
        args: Vec<Expr>,
    },
    Assert(Expr),
}

impl Stmt {
    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Stmt::Assign {
            name: name.into(),
            value,
        }
    }
}

/// Statements computing one value, plus the identifier that holds it
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub statements: Vec<Stmt>,
    pub identifier: String,
    pub ty: ValueType,
}

/// A routine parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: ValueType,
}

/// A generated helper routine (method mode)
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    pub body: Vec<Stmt>,
    /// Identifier holding the boolean result
    pub result: String,
    /// Expression the result equals, for targets that verify callers
    /// against contracts
    pub postcondition: Option<Expr>,
}

/// Every local declared in `stmts`, including loop counters and call
/// targets, in order of appearance
#[must_use]
pub fn declared_locals(stmts: &[Stmt]) -> Vec<(String, ValueType)> {
    let mut out = Vec::new();
    collect_locals(stmts, &mut out);
    out
}

fn collect_locals(stmts: &[Stmt], out: &mut Vec<(String, ValueType)>) {
    for stmt in stmts {
        match stmt {
            Stmt::Declare { name, ty, .. } | Stmt::Call { target: name, ty, .. } => {
                out.push((name.clone(), *ty));
            }
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_locals(then_branch, out);
                collect_locals(else_branch, out);
            }
            Stmt::BoundedLoop { counter, body, .. } => {
                out.push((counter.clone(), ValueType::Int));
                collect_locals(body, out);
            }
            Stmt::Assign { .. } | Stmt::Assert(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_all_collapses() {
        assert_eq!(Expr::and_all(vec![]), Expr::Bool(true));
        assert_eq!(Expr::and_all(vec![Expr::ident("a")]), Expr::ident("a"));
        assert!(matches!(
            Expr::and_all(vec![Expr::ident("a"), Expr::ident("b")]),
            Expr::Nary(NaryOp::And, _)
        ));
    }

    #[test]
    fn test_coerce_only_widens_ints() {
        let e = Expr::ident("x");
        assert_eq!(
            e.clone().coerce(ValueType::Int, ValueType::Real),
            Expr::ToReal(Box::new(Expr::ident("x")))
        );
        assert_eq!(e.clone().coerce(ValueType::Real, ValueType::Real), e);
        assert_eq!(e.clone().coerce(ValueType::Bool, ValueType::Bool), e);
    }

    #[test]
    fn test_declared_locals_walks_nested_blocks() {
        let stmts = vec![
            Stmt::Declare {
                name: "tmp0".to_string(),
                ty: ValueType::Bool,
                init: Some(Expr::Bool(true)),
            },
            Stmt::BoundedLoop {
                counter: "idx1".to_string(),
                lo: -1,
                hi: 1,
                guard: Expr::ident("tmp0"),
                body: vec![Stmt::If {
                    cond: Expr::Bool(true),
                    then_branch: vec![Stmt::Declare {
                        name: "tmp2".to_string(),
                        ty: ValueType::Real,
                        init: None,
                    }],
                    else_branch: vec![Stmt::Call {
                        target: "tmp3".to_string(),
                        ty: ValueType::Bool,
                        routine: "formula0".to_string(),
                        args: vec![],
                    }],
                }],
            },
        ];
        let names: Vec<String> = declared_locals(&stmts).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["tmp0", "idx1", "tmp2", "tmp3"]);
    }
}
