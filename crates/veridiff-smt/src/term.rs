//! Terms of the supported SMT-LIB fragment
//!
//! A [`Term`] is an immutable tree. Every node knows its sort, either
//! directly (variables, constants, applications) or structurally
//! (quantifiers, `let`, labels). `Display` prints valid SMT-LIB, which is
//! what bug reports persist and what division guards are keyed on.

use crate::lexer::is_simple_symbol;
use crate::sort::Sort;
use std::collections::BTreeSet;
use std::fmt;

/// Quantifier kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Forall,
    Exists,
}

impl Quantifier {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Quantifier::Forall => "forall",
            Quantifier::Exists => "exists",
        }
    }
}

/// An SMT-LIB term
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Declared constant or bound variable
    Var { name: String, sort: Sort },
    /// Literal: `true`, `false`, a numeral or a decimal
    Const { literal: String, sort: Sort },
    /// Operator application
    App {
        op: String,
        args: Vec<Term>,
        sort: Sort,
    },
    Quant {
        kind: Quantifier,
        bindings: Vec<(String, Sort)>,
        body: Box<Term>,
    },
    /// Parallel `let`
    Let {
        bindings: Vec<(String, Term)>,
        body: Box<Term>,
    },
    /// `(! inner :named label)`
    Labeled { label: String, inner: Box<Term> },
}

/// Result sort of a built-in operator, `None` for anything else
#[must_use]
pub fn builtin_result_sort(op: &str, args: &[Term]) -> Option<Sort> {
    match op {
        "not" | "and" | "or" | "xor" | "=>" | "=" | "distinct" | "<" | "<=" | ">" | ">=" => {
            Some(Sort::Bool)
        }
        "ite" => args.get(1).map(Term::sort),
        "+" | "-" | "*" => {
            if args.iter().any(|a| a.sort() == Sort::Real) {
                Some(Sort::Real)
            } else {
                Some(Sort::Int)
            }
        }
        "/" | "to_real" => Some(Sort::Real),
        "div" | "mod" | "abs" => Some(Sort::Int),
        _ => None,
    }
}

impl Term {
    pub fn var(name: impl Into<String>, sort: Sort) -> Self {
        Term::Var {
            name: name.into(),
            sort,
        }
    }

    #[must_use]
    pub fn bool(value: bool) -> Self {
        Term::Const {
            literal: value.to_string(),
            sort: Sort::Bool,
        }
    }

    /// Integer literal; negative values become `(- n)`
    #[must_use]
    pub fn int(value: i64) -> Self {
        let literal = Term::Const {
            literal: value.unsigned_abs().to_string(),
            sort: Sort::Int,
        };
        if value < 0 {
            Term::app("-", vec![literal])
        } else {
            literal
        }
    }

    /// Decimal literal from its SMT-LIB text (`"2.5"`)
    pub fn real(literal: impl Into<String>) -> Self {
        Term::Const {
            literal: literal.into(),
            sort: Sort::Real,
        }
    }

    /// Application of a built-in operator
    pub fn app(op: impl Into<String>, args: Vec<Term>) -> Self {
        let op = op.into();
        let sort = builtin_result_sort(&op, &args).unwrap_or_else(|| Sort::Named(op.clone()));
        Term::App { op, args, sort }
    }

    #[must_use]
    pub fn quant(kind: Quantifier, bindings: Vec<(String, Sort)>, body: Term) -> Self {
        Term::Quant {
            kind,
            bindings,
            body: Box::new(body),
        }
    }

    #[must_use]
    pub fn let_in(bindings: Vec<(String, Term)>, body: Term) -> Self {
        Term::Let {
            bindings,
            body: Box::new(body),
        }
    }

    pub fn labeled(label: impl Into<String>, inner: Term) -> Self {
        Term::Labeled {
            label: label.into(),
            inner: Box::new(inner),
        }
    }

    /// Sort of this term
    #[must_use]
    pub fn sort(&self) -> Sort {
        match self {
            Term::Var { sort, .. } | Term::Const { sort, .. } | Term::App { sort, .. } => {
                sort.clone()
            }
            Term::Quant { .. } => Sort::Bool,
            Term::Let { body, .. } => body.sort(),
            Term::Labeled { inner, .. } => inner.sort(),
        }
    }

    /// Operator name for applications
    #[must_use]
    pub fn op(&self) -> Option<&str> {
        match self {
            Term::App { op, .. } => Some(op),
            _ => None,
        }
    }

    /// Number of nodes in the tree
    #[must_use]
    pub fn size(&self) -> usize {
        1 + match self {
            Term::Var { .. } | Term::Const { .. } => 0,
            Term::App { args, .. } => args.iter().map(Term::size).sum(),
            Term::Quant { body, .. } => body.size(),
            Term::Let { bindings, body } => {
                bindings.iter().map(|(_, t)| t.size()).sum::<usize>() + body.size()
            }
            Term::Labeled { inner, .. } => inner.size(),
        }
    }

    /// Variable names occurring free in the term, sorted
    #[must_use]
    pub fn free_symbols(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_free(&mut Vec::new(), &mut names);
        names
    }

    fn collect_free<'t>(&'t self, bound: &mut Vec<&'t str>, out: &mut BTreeSet<&'t str>) {
        match self {
            Term::Var { name, .. } => {
                if !bound.contains(&name.as_str()) {
                    out.insert(name.as_str());
                }
            }
            Term::Const { .. } => {}
            Term::App { args, .. } => {
                for arg in args {
                    arg.collect_free(bound, out);
                }
            }
            Term::Quant { bindings, body, .. } => {
                let depth = bound.len();
                bound.extend(bindings.iter().map(|(name, _)| name.as_str()));
                body.collect_free(bound, out);
                bound.truncate(depth);
            }
            Term::Let { bindings, body } => {
                // Bound terms are evaluated in the enclosing scope.
                for (_, term) in bindings {
                    term.collect_free(bound, out);
                }
                let depth = bound.len();
                bound.extend(bindings.iter().map(|(name, _)| name.as_str()));
                body.collect_free(bound, out);
                bound.truncate(depth);
            }
            Term::Labeled { inner, .. } => inner.collect_free(bound, out),
        }
    }
}

/// Write a symbol, quoting it with `|...|` when needed
pub(crate) fn write_symbol(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_simple_symbol(name) {
        write!(f, "{name}")
    } else {
        write!(f, "|{name}|")
    }
}

/// Display adapter for a symbol
pub struct Symbol<'a>(pub &'a str);

impl fmt::Display for Symbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_symbol(f, self.0)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var { name, .. } => write_symbol(f, name),
            Term::Const { literal, .. } => write!(f, "{literal}"),
            Term::App { op, args, .. } => {
                write!(f, "(")?;
                write_symbol(f, op)?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            Term::Quant {
                kind,
                bindings,
                body,
            } => {
                write!(f, "({} (", kind.keyword())?;
                for (i, (name, sort)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} {sort})", Symbol(name))?;
                }
                write!(f, ") {body})")
            }
            Term::Let { bindings, body } => {
                write!(f, "(let (")?;
                for (i, (name, term)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} {term})", Symbol(name))?;
                }
                write!(f, ") {body})")
            }
            Term::Labeled { label, inner } => {
                write!(f, "(! {inner} :named {})", Symbol(label))
            }
        }
    }
}
