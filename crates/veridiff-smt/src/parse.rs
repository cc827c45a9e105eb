//! Elaboration of s-expressions into scripts and terms
//!
//! Symbols are resolved against the declarations seen so far and the
//! enclosing binders, so every [`Term::Var`] carries its sort. Bitvector
//! and string literals, indexed identifiers and higher-order heads are
//! rejected as unsupported.

use crate::error::{SmtError, SmtResult};
use crate::script::{Command, Script};
use crate::sexp::{read_sexps, SExpr};
use crate::sort::Sort;
use crate::term::{builtin_result_sort, Quantifier, Term};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Parse a complete SMT-LIB script
pub fn parse_script(input: &str) -> SmtResult<Script> {
    let mut elaborator = Elaborator::default();
    let commands = read_sexps(input)?
        .iter()
        .map(|sexp| elaborator.command(sexp))
        .collect::<SmtResult<Vec<_>>>()?;
    Ok(Script::new(commands))
}

/// Parse a single term; `symbols` lists the constants in scope
pub fn parse_term(input: &str, symbols: &IndexMap<String, Sort>) -> SmtResult<Term> {
    let mut elaborator = Elaborator::default();
    for (name, sort) in symbols {
        elaborator
            .globals
            .insert(name.clone(), Signature::Const(sort.clone()));
    }
    let sexps = read_sexps(input)?;
    match sexps.as_slice() {
        [single] => elaborator.term(single),
        _ => Err(SmtError::parse(
            format!("expected one term, found {}", sexps.len()),
            None,
        )),
    }
}

#[derive(Debug, Clone)]
enum Signature {
    Const(Sort),
    Fun(Sort),
}

#[derive(Debug, Default)]
struct Elaborator {
    globals: HashMap<String, Signature>,
    /// Innermost binder last
    locals: Vec<(String, Sort)>,
}

fn symbol_at<'s>(
    items: &'s [SExpr],
    index: usize,
    pos: usize,
    what: &str,
) -> SmtResult<&'s str> {
    items
        .get(index)
        .and_then(SExpr::as_symbol)
        .ok_or_else(|| SmtError::parse(format!("expected {what}"), Some(pos)))
}

fn sort_of(sexp: &SExpr) -> SmtResult<Sort> {
    match sexp {
        SExpr::Symbol(name) => Ok(Sort::from_symbol(name)),
        SExpr::List(..) => Ok(Sort::Named(sexp.to_string())),
        other => Err(SmtError::parse(format!("expected a sort, found `{other}`"), None)),
    }
}

fn sorted_vars(sexp: &SExpr, pos: usize) -> SmtResult<Vec<(String, Sort)>> {
    let list = sexp
        .as_list()
        .ok_or_else(|| SmtError::parse("expected a sorted variable list", Some(pos)))?;
    list.iter()
        .map(|entry| match entry.as_list() {
            Some([SExpr::Symbol(name), sort]) => Ok((name.clone(), sort_of(sort)?)),
            _ => Err(SmtError::parse(
                format!("malformed sorted variable `{entry}`"),
                entry.position().or(Some(pos)),
            )),
        })
        .collect()
}

impl Elaborator {
    fn command(&mut self, sexp: &SExpr) -> SmtResult<Command> {
        let pos = sexp.position();
        let items = sexp
            .as_list()
            .ok_or_else(|| SmtError::parse(format!("expected a command, found `{sexp}`"), pos))?;
        let pos = pos.unwrap_or_default();
        let head = symbol_at(items, 0, pos, "a command name")?;
        let command = match head {
            "set-logic" => Command::SetLogic(symbol_at(items, 1, pos, "a logic")?.to_string()),
            "set-info" | "set-option" => {
                let keyword = match items.get(1) {
                    Some(SExpr::Keyword(k)) => k.clone(),
                    _ => return Err(SmtError::parse("expected a keyword", Some(pos))),
                };
                let value = items.get(2).map(ToString::to_string);
                if head == "set-info" {
                    Command::SetInfo { keyword, value }
                } else {
                    Command::SetOption { keyword, value }
                }
            }
            "declare-const" => {
                let name = symbol_at(items, 1, pos, "a constant name")?.to_string();
                let sort = sort_of(
                    items
                        .get(2)
                        .ok_or_else(|| SmtError::parse("missing sort", Some(pos)))?,
                )?;
                self.globals
                    .insert(name.clone(), Signature::Const(sort.clone()));
                Command::DeclareConst { name, sort }
            }
            "declare-fun" => {
                let name = symbol_at(items, 1, pos, "a function name")?.to_string();
                let (Some(params), Some(sort)) =
                    (items.get(2).and_then(SExpr::as_list), items.get(3))
                else {
                    return Err(SmtError::parse("malformed declare-fun", Some(pos)));
                };
                let params = params.iter().map(sort_of).collect::<SmtResult<Vec<_>>>()?;
                let sort = sort_of(sort)?;
                let signature = if params.is_empty() {
                    Signature::Const(sort.clone())
                } else {
                    Signature::Fun(sort.clone())
                };
                self.globals.insert(name.clone(), signature);
                Command::DeclareFun { name, params, sort }
            }
            "define-fun" => {
                let name = symbol_at(items, 1, pos, "a function name")?.to_string();
                let (Some(params), Some(sort), Some(body)) =
                    (items.get(2), items.get(3), items.get(4))
                else {
                    return Err(SmtError::parse("malformed define-fun", Some(pos)));
                };
                let params = sorted_vars(params, pos)?;
                let sort = sort_of(sort)?;
                let depth = self.locals.len();
                self.locals.extend(params.iter().cloned());
                let body = self.term(body);
                self.locals.truncate(depth);
                let body = body?;
                let signature = if params.is_empty() {
                    Signature::Const(sort.clone())
                } else {
                    Signature::Fun(sort.clone())
                };
                self.globals.insert(name.clone(), signature);
                Command::DefineFun {
                    name,
                    params,
                    sort,
                    body,
                }
            }
            "assert" => match items {
                [_, term] => Command::Assert(self.term(term)?),
                _ => {
                    return Err(SmtError::Arity {
                        op: "assert".to_string(),
                        expected: "1",
                        actual: items.len() - 1,
                    })
                }
            },
            "check-sat" => Command::CheckSat,
            "push" | "pop" => {
                let levels = match items.get(1) {
                    Some(SExpr::Numeral(n)) => n
                        .parse()
                        .map_err(|_| SmtError::parse(format!("bad level `{n}`"), Some(pos)))?,
                    _ => 1,
                };
                if head == "push" {
                    Command::Push(levels)
                } else {
                    Command::Pop(levels)
                }
            }
            "get-model" => Command::GetModel,
            "exit" => Command::Exit,
            _ => Command::Other(sexp.to_string()),
        };
        Ok(command)
    }

    fn term(&mut self, sexp: &SExpr) -> SmtResult<Term> {
        match sexp {
            SExpr::True => Ok(Term::bool(true)),
            SExpr::False => Ok(Term::bool(false)),
            SExpr::Numeral(n) => Ok(Term::Const {
                literal: n.clone(),
                sort: Sort::Int,
            }),
            SExpr::Decimal(d) => Ok(Term::real(d.clone())),
            SExpr::Symbol(name) => self.symbol(name),
            SExpr::Bitvector(lit) | SExpr::String(lit) => {
                Err(SmtError::Unsupported(format!("literal {lit}")))
            }
            SExpr::Keyword(k) => Err(SmtError::parse(format!("unexpected keyword {k}"), None)),
            SExpr::List(items, pos) => self.compound(sexp, items, *pos),
        }
    }

    fn symbol(&self, name: &str) -> SmtResult<Term> {
        if let Some((_, sort)) = self.locals.iter().rev().find(|(n, _)| n == name) {
            return Ok(Term::var(name, sort.clone()));
        }
        match self.globals.get(name) {
            Some(Signature::Const(sort)) => Ok(Term::var(name, sort.clone())),
            Some(Signature::Fun(_)) => Err(SmtError::Unsupported(format!(
                "function `{name}` used without arguments"
            ))),
            None => Err(SmtError::UnknownSymbol(name.to_string())),
        }
    }

    fn compound(&mut self, sexp: &SExpr, items: &[SExpr], pos: usize) -> SmtResult<Term> {
        let Some(head) = items.first() else {
            return Err(SmtError::parse("empty application", Some(pos)));
        };
        match head.as_symbol() {
            Some("let") => self.let_term(items, pos),
            Some("forall") => self.quantifier(Quantifier::Forall, items, pos),
            Some("exists") => self.quantifier(Quantifier::Exists, items, pos),
            Some("!") => self.annotated(items, pos),
            Some("_") | Some("as") | Some("match") | Some("lambda") => {
                Err(SmtError::Unsupported(sexp.to_string()))
            }
            Some(op) => {
                let args = items[1..]
                    .iter()
                    .map(|a| self.term(a))
                    .collect::<SmtResult<Vec<_>>>()?;
                let sort = match builtin_result_sort(op, &args) {
                    Some(sort) => sort,
                    None => match self.globals.get(op) {
                        Some(Signature::Fun(sort)) => sort.clone(),
                        Some(Signature::Const(_)) => {
                            return Err(SmtError::Sort {
                                term: sexp.to_string(),
                                message: format!("`{op}` is not a function"),
                            })
                        }
                        None => return Err(SmtError::UnknownSymbol(op.to_string())),
                    },
                };
                Ok(Term::App {
                    op: op.to_string(),
                    args,
                    sort,
                })
            }
            None => Err(SmtError::Unsupported(format!(
                "application with head `{head}`"
            ))),
        }
    }

    fn let_term(&mut self, items: &[SExpr], pos: usize) -> SmtResult<Term> {
        let [_, SExpr::List(bindings, _), body] = items else {
            return Err(SmtError::parse("malformed let", Some(pos)));
        };
        // Parallel semantics: every bound term sees the outer scope only.
        let mut bound = Vec::with_capacity(bindings.len());
        for binding in bindings {
            match binding.as_list() {
                Some([SExpr::Symbol(name), term]) => bound.push((name.clone(), self.term(term)?)),
                _ => {
                    return Err(SmtError::parse(
                        format!("malformed let binding `{binding}`"),
                        binding.position(),
                    ))
                }
            }
        }
        let depth = self.locals.len();
        self.locals
            .extend(bound.iter().map(|(name, term)| (name.clone(), term.sort())));
        let body = self.term(body);
        self.locals.truncate(depth);
        Ok(Term::let_in(bound, body?))
    }

    fn quantifier(&mut self, kind: Quantifier, items: &[SExpr], pos: usize) -> SmtResult<Term> {
        let [_, vars, body] = items else {
            return Err(SmtError::parse(
                format!("malformed {}", kind.keyword()),
                Some(pos),
            ));
        };
        let bindings = sorted_vars(vars, pos)?;
        let depth = self.locals.len();
        self.locals.extend(bindings.iter().cloned());
        let body = self.term(body);
        self.locals.truncate(depth);
        Ok(Term::quant(kind, bindings, body?))
    }

    fn annotated(&mut self, items: &[SExpr], pos: usize) -> SmtResult<Term> {
        let Some(inner) = items.get(1) else {
            return Err(SmtError::parse("empty annotation", Some(pos)));
        };
        let inner = self.term(inner)?;
        let label = items[2..].windows(2).find_map(|pair| match pair {
            [SExpr::Keyword(k), SExpr::Symbol(label)] if k == ":named" => Some(label.clone()),
            _ => None,
        });
        Ok(match label {
            Some(label) => Term::labeled(label, inner),
            None => inner,
        })
    }
}
