//! Sort checking for the supported fragment
//!
//! Arithmetic is lenient about mixing `Int` and `Real` the way mainstream
//! solvers are; everything else must agree exactly. Applications of
//! declared functions are accepted as elaborated.

use crate::error::{SmtError, SmtResult};
use crate::script::{Command, Script};
use crate::sort::Sort;
use crate::term::Term;

const EXCERPT_LEN: usize = 80;

fn excerpt(term: &Term) -> String {
    let text = term.to_string();
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

fn compatible(a: &Sort, b: &Sort) -> bool {
    a == b || (a.is_numeric() && b.is_numeric())
}

/// Check every assertion and definition of `script`
pub fn check_script(script: &Script) -> SmtResult<()> {
    for command in &script.commands {
        match command {
            Command::Assert(term) => {
                let sort = check_term(term)?;
                if sort != Sort::Bool {
                    return Err(SmtError::Sort {
                        term: excerpt(term),
                        message: format!("assertion has sort {sort}"),
                    });
                }
            }
            Command::DefineFun { sort, body, .. } => {
                let actual = check_term(body)?;
                if !compatible(sort, &actual) {
                    return Err(SmtError::Sort {
                        term: excerpt(body),
                        message: format!("definition declared {sort} but has sort {actual}"),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Check `term` and return its sort
pub fn check_term(term: &Term) -> SmtResult<Sort> {
    match term {
        Term::Var { sort, .. } | Term::Const { sort, .. } => Ok(sort.clone()),
        Term::Labeled { inner, .. } => check_term(inner),
        Term::Let { bindings, body } => {
            for (_, bound) in bindings {
                check_term(bound)?;
            }
            check_term(body)
        }
        Term::Quant { body, .. } => {
            let sort = check_term(body)?;
            if sort != Sort::Bool {
                return Err(SmtError::Sort {
                    term: excerpt(term),
                    message: format!("quantifier body has sort {sort}"),
                });
            }
            Ok(Sort::Bool)
        }
        Term::App { op, args, sort } => {
            let sorts = args.iter().map(check_term).collect::<SmtResult<Vec<_>>>()?;
            check_application(term, op, &sorts)?;
            Ok(sort.clone())
        }
    }
}

fn arity(op: &str, actual: usize, ok: bool, expected: &'static str) -> SmtResult<()> {
    if ok {
        Ok(())
    } else {
        Err(SmtError::Arity {
            op: op.to_string(),
            expected,
            actual,
        })
    }
}

fn check_application(term: &Term, op: &str, sorts: &[Sort]) -> SmtResult<()> {
    let n = sorts.len();
    let mismatch = |message: String| SmtError::Sort {
        term: excerpt(term),
        message,
    };
    let all = |pred: fn(&Sort) -> bool, what: &str| -> SmtResult<()> {
        match sorts.iter().find(|s| !pred(s)) {
            Some(bad) => Err(mismatch(format!("`{op}` expects {what} arguments, got {bad}"))),
            None => Ok(()),
        }
    };
    match op {
        "not" => {
            arity(op, n, n == 1, "1")?;
            all(|s| *s == Sort::Bool, "Bool")
        }
        "and" | "or" | "xor" | "=>" => {
            arity(op, n, n >= 1, "at least 1")?;
            all(|s| *s == Sort::Bool, "Bool")
        }
        "=" | "distinct" => {
            arity(op, n, n >= 2, "at least 2")?;
            match sorts.iter().find(|s| !compatible(&sorts[0], s)) {
                Some(bad) => Err(mismatch(format!(
                    "`{op}` mixes {} and {bad}",
                    sorts[0]
                ))),
                None => Ok(()),
            }
        }
        "ite" => {
            arity(op, n, n == 3, "3")?;
            if sorts[0] != Sort::Bool {
                return Err(mismatch(format!("condition has sort {}", sorts[0])));
            }
            if !compatible(&sorts[1], &sorts[2]) {
                return Err(mismatch(format!(
                    "branches have sorts {} and {}",
                    sorts[1], sorts[2]
                )));
            }
            Ok(())
        }
        "+" | "-" | "*" => {
            arity(op, n, n >= 1, "at least 1")?;
            all(Sort::is_numeric, "numeric")
        }
        "<" | "<=" | ">" | ">=" | "/" => {
            arity(op, n, n >= 2, "at least 2")?;
            all(Sort::is_numeric, "numeric")
        }
        "div" => {
            arity(op, n, n >= 2, "at least 2")?;
            all(|s| *s == Sort::Int, "Int")
        }
        "mod" => {
            arity(op, n, n == 2, "2")?;
            all(|s| *s == Sort::Int, "Int")
        }
        "abs" | "to_real" => {
            arity(op, n, n == 1, "1")?;
            all(|s| *s == Sort::Int, "Int")
        }
        _ => Ok(()),
    }
}
