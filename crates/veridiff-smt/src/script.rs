//! SMT-LIB scripts and the views the lowering needs

use crate::sort::Sort;
use crate::term::{Symbol, Term};
use indexmap::IndexMap;
use std::fmt;

/// One script command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetLogic(String),
    SetInfo {
        keyword: String,
        value: Option<String>,
    },
    SetOption {
        keyword: String,
        value: Option<String>,
    },
    DeclareConst {
        name: String,
        sort: Sort,
    },
    DeclareFun {
        name: String,
        params: Vec<Sort>,
        sort: Sort,
    },
    DefineFun {
        name: String,
        params: Vec<(String, Sort)>,
        sort: Sort,
        body: Term,
    },
    Assert(Term),
    CheckSat,
    Push(u32),
    Pop(u32),
    GetModel,
    Exit,
    /// Any other command, kept verbatim
    Other(String),
}

/// An ordered list of commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub commands: Vec<Command>,
}

impl Script {
    #[must_use]
    pub fn new(commands: Vec<Command>) -> Self {
        Script { commands }
    }

    /// Asserted terms in script order
    pub fn assertions(&self) -> impl Iterator<Item = &Term> {
        self.commands.iter().filter_map(|c| match c {
            Command::Assert(t) => Some(t),
            _ => None,
        })
    }

    /// Assertions in scope at the last `check-sat`, in script order.
    ///
    /// Commands are replayed against an assertion stack: `push n` opens n
    /// frames and `pop n` discards the n innermost ones. Assertions made
    /// after the last `check-sat` are not part of any query. A script
    /// without `check-sat` yields everything in scope at its end.
    #[must_use]
    pub fn final_assertions(&self) -> Vec<&Term> {
        let mut frames: Vec<Vec<&Term>> = vec![Vec::new()];
        let mut queried = None;
        for command in &self.commands {
            match command {
                Command::Push(n) => {
                    frames.extend((0..*n).map(|_| Vec::new()));
                }
                Command::Pop(n) => {
                    // The outermost frame cannot be popped.
                    let keep = frames.len().saturating_sub(*n as usize).max(1);
                    frames.truncate(keep);
                }
                Command::Assert(term) => {
                    if let Some(frame) = frames.last_mut() {
                        frame.push(term);
                    }
                }
                Command::CheckSat => queried = Some(frames.concat()),
                _ => {}
            }
        }
        queried.unwrap_or_else(|| frames.concat())
    }

    /// Nullary declarations, in declaration order
    #[must_use]
    pub fn free_vars(&self) -> IndexMap<String, Sort> {
        let mut vars = IndexMap::new();
        for command in &self.commands {
            match command {
                Command::DeclareConst { name, sort } => {
                    vars.insert(name.clone(), sort.clone());
                }
                Command::DeclareFun { name, params, sort } if params.is_empty() => {
                    vars.insert(name.clone(), sort.clone());
                }
                _ => {}
            }
        }
        vars
    }

    /// Nullary definitions with their bodies, in definition order
    #[must_use]
    pub fn defined_vars(&self) -> IndexMap<String, (Sort, Term)> {
        let mut vars = IndexMap::new();
        for command in &self.commands {
            if let Command::DefineFun {
                name,
                params,
                sort,
                body,
            } = command
            {
                if params.is_empty() {
                    vars.insert(name.clone(), (sort.clone(), body.clone()));
                }
            }
        }
        vars
    }

    /// Number of `check-sat` commands, i.e. expected verdicts
    #[must_use]
    pub fn check_sat_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::CheckSat))
            .count()
    }
}

fn write_attribute(
    f: &mut fmt::Formatter<'_>,
    head: &str,
    keyword: &str,
    value: &Option<String>,
) -> fmt::Result {
    match value {
        Some(v) => write!(f, "({head} {keyword} {v})"),
        None => write!(f, "({head} {keyword})"),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLogic(logic) => write!(f, "(set-logic {logic})"),
            Command::SetInfo { keyword, value } => write_attribute(f, "set-info", keyword, value),
            Command::SetOption { keyword, value } => {
                write_attribute(f, "set-option", keyword, value)
            }
            Command::DeclareConst { name, sort } => {
                write!(f, "(declare-const {} {sort})", Symbol(name))
            }
            Command::DeclareFun { name, params, sort } => {
                let params: Vec<String> = params.iter().map(ToString::to_string).collect();
                write!(f, "(declare-fun {} ({}) {sort})", Symbol(name), params.join(" "))
            }
            Command::DefineFun {
                name,
                params,
                sort,
                body,
            } => {
                let params: Vec<String> = params
                    .iter()
                    .map(|(n, s)| format!("({} {s})", Symbol(n)))
                    .collect();
                write!(
                    f,
                    "(define-fun {} ({}) {sort} {body})",
                    Symbol(name),
                    params.join(" ")
                )
            }
            Command::Assert(term) => write!(f, "(assert {term})"),
            Command::CheckSat => write!(f, "(check-sat)"),
            Command::Push(n) => write!(f, "(push {n})"),
            Command::Pop(n) => write!(f, "(pop {n})"),
            Command::GetModel => write!(f, "(get-model)"),
            Command::Exit => write!(f, "(exit)"),
            Command::Other(text) => write!(f, "{text}"),
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{command}")?;
        }
        Ok(())
    }
}
