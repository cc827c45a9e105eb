//! Binding context: which generated identifier an SMT symbol denotes
//!
//! A context is copied when lowering enters a `let` or a quantifier and
//! shared by reference everywhere else, so bindings made inside a scope
//! never leak to siblings lowered after it.

use crate::binding::LanguageBinding;
use crate::error::{LowerError, LowerResult};
use crate::ir::{Param, ValueType};
use crate::options::LowerOptions;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use veridiff_smt::{Sort, Term};

/// Prefixes of identifiers the lowering generates
pub(crate) const TMP_PREFIX: &str = "tmp";
pub(crate) const DIV_PREFIX: &str = "div";
pub(crate) const COUNTER_PREFIX: &str = "idx";
pub(crate) const ROUTINE_PREFIX: &str = "formula";
pub(crate) const CHECK_ROUTINE: &str = "check";

/// A symbol's generated identifier and type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub ident: String,
    pub ty: ValueType,
}

/// Value type of a sort under `options`
pub fn value_type(name: &str, sort: &Sort, options: &LowerOptions) -> LowerResult<ValueType> {
    match sort {
        Sort::Bool => Ok(ValueType::Bool),
        Sort::Int if options.real_mode => Ok(ValueType::Real),
        Sort::Int => Ok(ValueType::Int),
        Sort::Real => Ok(ValueType::Real),
        Sort::Named(other) => Err(LowerError::UnsupportedSort {
            name: name.to_string(),
            sort: other.clone(),
        }),
    }
}

/// Make an SMT symbol usable as an identifier in most targets
///
/// `!` becomes `1`; `$ . ~ | ? # ( ) ^` and spaces are dropped, as are
/// leading and trailing underscores.
#[must_use]
pub fn normalize_identifier(name: &str) -> String {
    let mapped: String = name
        .chars()
        .filter_map(|c| match c {
            '!' => Some('1'),
            '$' | '.' | '~' | '|' | '?' | '#' | ' ' | '(' | ')' | '^' => None,
            c => Some(c),
        })
        .collect();
    mapped.trim_matches('_').to_string()
}

fn is_generated_like(ident: &str) -> bool {
    if ident == CHECK_ROUTINE {
        return true;
    }
    [TMP_PREFIX, DIV_PREFIX, COUNTER_PREFIX, ROUTINE_PREFIX]
        .iter()
        .any(|prefix| {
            ident
                .strip_prefix(prefix)
                .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        })
}

fn is_plain_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Symbol-to-identifier mapping in effect for one subterm
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    free_vars: IndexMap<String, Binding>,
    let_vars: HashMap<String, Binding>,
    defined_vars: HashMap<String, Binding>,
}

impl BindingContext {
    /// Context for a formula's free variables
    ///
    /// Defined symbols are excluded: they are lowered as values at routine
    /// entry and bound with [`bind_defined`](Self::bind_defined).
    pub fn new(
        free_vars: &IndexMap<String, Sort>,
        defined: &IndexMap<String, (Sort, Term)>,
        binding: &dyn LanguageBinding,
        options: &LowerOptions,
    ) -> LowerResult<Self> {
        let mut used = HashSet::new();
        let mut ctx = BindingContext::default();
        for (name, sort) in free_vars {
            if defined.contains_key(name) {
                continue;
            }
            let ty = value_type(name, sort, options)?;
            let mut ident = normalize_identifier(name);
            if !is_plain_identifier(&ident)
                || binding.is_reserved(&ident)
                || is_generated_like(&ident)
            {
                ident = format!("v_{}", ident.replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
            }
            let base = ident.clone();
            let mut suffix = 1;
            while !used.insert(ident.clone()) {
                ident = format!("{base}_{suffix}");
                suffix += 1;
            }
            ctx.free_vars.insert(name.clone(), Binding { ident, ty });
        }
        Ok(ctx)
    }

    /// Resolve a symbol: `let` scope first, then definitions, then free
    /// variables
    pub fn resolve(&self, name: &str) -> LowerResult<&Binding> {
        self.let_vars
            .get(name)
            .or_else(|| self.defined_vars.get(name))
            .or_else(|| self.free_vars.get(name))
            .ok_or_else(|| LowerError::UnboundSymbol(name.to_string()))
    }

    /// Bind a `let` or quantified name in this (copied) scope
    pub fn bind_local(&mut self, name: &str, ident: String, ty: ValueType) {
        self.let_vars.insert(name.to_string(), Binding { ident, ty });
    }

    pub fn bind_defined(&mut self, name: &str, ident: String, ty: ValueType) {
        self.defined_vars
            .insert(name.to_string(), Binding { ident, ty });
    }

    #[must_use]
    pub fn is_let_bound(&self, name: &str) -> bool {
        self.let_vars.contains_key(name)
    }

    /// Memo key for a division term: its text plus the identifiers its
    /// locally bound names resolve to, so shadowed names do not collide
    #[must_use]
    pub fn division_key(&self, term: &Term) -> String {
        let mut key = term.to_string();
        for name in term.free_symbols() {
            if let Some(local) = self.let_vars.get(name) {
                key.push_str(&format!(" {name}={}", local.ident));
            }
        }
        key
    }

    /// Free variables as routine parameters, in declaration order
    #[must_use]
    pub fn params(&self) -> Vec<Param> {
        self.free_vars
            .values()
            .map(|b| Param {
                name: b.ident.clone(),
                ty: b.ty,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{CBinding, SqlBinding};

    fn vars(names: &[&str]) -> IndexMap<String, Sort> {
        names.iter().map(|n| (n.to_string(), Sort::Int)).collect()
    }

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("x!1"), "x11");
        assert_eq!(normalize_identifier("|a.b c|"), "abc");
        assert_eq!(normalize_identifier("__y$^__"), "y");
        assert_eq!(normalize_identifier("f(x)"), "fx");
    }

    #[test]
    fn test_reserved_and_generated_names_are_prefixed() {
        let ctx = BindingContext::new(
            &vars(&["int", "tmp3", "tmpx", "3x", "?"]),
            &IndexMap::new(),
            &CBinding,
            &LowerOptions::default(),
        )
        .unwrap();
        let idents: Vec<String> = ctx.params().into_iter().map(|p| p.name).collect();
        assert_eq!(idents, vec!["v_int", "v_tmp3", "tmpx", "v_3x", "v_"]);
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let ctx = BindingContext::new(
            &vars(&["x!1", "x11", "x.11"]),
            &IndexMap::new(),
            &SqlBinding,
            &LowerOptions::default(),
        )
        .unwrap();
        let idents: Vec<String> = ctx.params().into_iter().map(|p| p.name).collect();
        assert_eq!(idents, vec!["x11", "x11_1", "x11_2"]);
    }

    #[test]
    fn test_defined_vars_are_not_params() {
        let defined = IndexMap::from([("y".to_string(), (Sort::Int, Term::int(1)))]);
        let ctx = BindingContext::new(
            &vars(&["x", "y"]),
            &defined,
            &CBinding,
            &LowerOptions::default(),
        )
        .unwrap();
        assert_eq!(ctx.params().len(), 1);
        assert!(ctx.resolve("y").is_err());
    }

    #[test]
    fn test_let_scope_shadows_and_copies() {
        let outer = BindingContext::new(
            &vars(&["x"]),
            &IndexMap::new(),
            &CBinding,
            &LowerOptions::default(),
        )
        .unwrap();
        let mut inner = outer.clone();
        inner.bind_local("x", "tmp7".to_string(), ValueType::Int);
        assert_eq!(inner.resolve("x").unwrap().ident, "tmp7");
        assert_eq!(outer.resolve("x").unwrap().ident, "x");
        assert!(inner.is_let_bound("x"));
        assert!(!outer.is_let_bound("x"));
    }

    #[test]
    fn test_real_mode_promotes_ints() {
        let options = LowerOptions {
            real_mode: true,
            ..LowerOptions::default()
        };
        assert_eq!(value_type("x", &Sort::Int, &options).unwrap(), ValueType::Real);
        assert!(value_type("a", &Sort::Named("String".to_string()), &options).is_err());
    }
}
