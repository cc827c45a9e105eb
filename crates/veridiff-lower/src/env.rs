//! Lowering environment
//!
//! Owns the state shared by every lowering call of one formula: the
//! fresh-identifier counter, the division-guard memo table and the helper
//! routines produced in method mode. It is threaded through the lowerer
//! as `&mut`, so there is exactly one writer at a time.

use crate::context::DIV_PREFIX;
use crate::error::{LowerError, LowerResult};
use crate::ir::{Param, Routine, ValueType};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct LoweringEnv {
    next_id: usize,
    limit: usize,
    /// Division key to its sentinel parameter
    division_guards: IndexMap<String, Param>,
    routines: Vec<Routine>,
}

impl LoweringEnv {
    /// Environment that issues at most `limit` fresh identifiers
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            next_id: 0,
            limit,
            division_guards: IndexMap::new(),
            routines: Vec::new(),
        }
    }

    /// A fresh identifier `<prefix><n>`, never repeated within this
    /// environment
    pub fn fresh(&mut self, prefix: &str) -> LowerResult<String> {
        if self.next_id >= self.limit {
            return Err(LowerError::FreshIdExhausted { limit: self.limit });
        }
        let id = format!("{prefix}{}", self.next_id);
        self.next_id += 1;
        Ok(id)
    }

    /// Sentinel parameter for the division term keyed by `key`
    ///
    /// Identical division terms share one sentinel.
    pub fn division_sentinel(&mut self, key: String, ty: ValueType) -> LowerResult<String> {
        if let Some(param) = self.division_guards.get(&key) {
            return Ok(param.name.clone());
        }
        let name = self.fresh(DIV_PREFIX)?;
        self.division_guards.insert(
            key,
            Param {
                name: name.clone(),
                ty,
            },
        );
        Ok(name)
    }

    /// Sentinel parameters in creation order
    pub fn sentinels(&self) -> impl Iterator<Item = &Param> {
        self.division_guards.values()
    }

    pub fn add_routine(&mut self, routine: Routine) {
        self.routines.push(routine);
    }

    #[must_use]
    pub fn routines(&self) -> &[Routine] {
        &self.routines
    }

    /// Number of identifiers issued so far
    #[must_use]
    pub fn issued(&self) -> usize {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique_across_prefixes() {
        let mut env = LoweringEnv::new(10);
        let a = env.fresh("tmp").unwrap();
        let b = env.fresh("idx").unwrap();
        let c = env.fresh("tmp").unwrap();
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("tmp0", "idx1", "tmp2"));
        assert_eq!(env.issued(), 3);
    }

    #[test]
    fn test_fresh_id_limit() {
        let mut env = LoweringEnv::new(2);
        env.fresh("tmp").unwrap();
        env.fresh("tmp").unwrap();
        assert_eq!(
            env.fresh("tmp"),
            Err(LowerError::FreshIdExhausted { limit: 2 })
        );
    }

    #[test]
    fn test_division_sentinels_are_memoized() {
        let mut env = LoweringEnv::new(100);
        let a = env
            .division_sentinel("(div x y)".to_string(), ValueType::Int)
            .unwrap();
        let b = env
            .division_sentinel("(mod x y)".to_string(), ValueType::Int)
            .unwrap();
        let c = env
            .division_sentinel("(div x y)".to_string(), ValueType::Int)
            .unwrap();
        assert_eq!(a, c);
        assert_ne!(a, b);
        let names: Vec<&str> = env.sentinels().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["div0", "div1"]);
    }
}
