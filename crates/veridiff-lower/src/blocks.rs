//! Short-circuit boolean blocks and bounded quantifier loops
//!
//! Each operand is lowered inside the branch that needs it, so an operand
//! after a deciding one is never evaluated. That keeps guarded divisions
//! and nested quantifiers from running when the result is already known.

use crate::context::{value_type, BindingContext, COUNTER_PREFIX, TMP_PREFIX};
use crate::env::LoweringEnv;
use crate::error::{LowerError, LowerResult};
use crate::ir::{CodeBlock, Expr, Stmt, ValueType};
use crate::lower::Lowerer;
use crate::options::QUANTIFIER_BOUND;
use std::vec::IntoIter;
use veridiff_smt::{Quantifier, Sort, Term};

/// Operand of a boolean block: a term still to lower, or a block already
/// lowered (a routine call in method mode)
#[derive(Debug, Clone)]
pub enum Operand<'t> {
    Term(&'t Term),
    Lowered(CodeBlock),
}

fn declare_flag(name: &str, value: bool) -> Stmt {
    Stmt::Declare {
        name: name.to_string(),
        ty: ValueType::Bool,
        init: Some(Expr::Bool(value)),
    }
}

impl Lowerer<'_> {
    fn operand(
        &self,
        operand: Operand<'_>,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        match operand {
            Operand::Term(term) => self.lower(term, ctx, env),
            Operand::Lowered(block) => Ok(block),
        }
    }

    fn flag_block(
        &self,
        init: bool,
        env: &mut LoweringEnv,
        chain: impl FnOnce(&Self, &str, &mut LoweringEnv) -> LowerResult<Vec<Stmt>>,
    ) -> LowerResult<CodeBlock> {
        let identifier = env.fresh(TMP_PREFIX)?;
        let mut statements = vec![declare_flag(&identifier, init)];
        statements.extend(chain(self, &identifier, env)?);
        Ok(CodeBlock {
            statements,
            identifier,
            ty: ValueType::Bool,
        })
    }

    /// `false`, set to `true` in the innermost of nested conditionals
    pub fn and_block(
        &self,
        operands: Vec<Operand<'_>>,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        self.flag_block(false, env, |this, id, env| {
            this.and_chain(operands.into_iter(), id, ctx, env)
        })
    }

    fn and_chain(
        &self,
        mut rest: IntoIter<Operand<'_>>,
        id: &str,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Vec<Stmt>> {
        let Some(next) = rest.next() else {
            return Ok(vec![Stmt::assign(id, Expr::Bool(true))]);
        };
        let block = self.operand(next, ctx, env)?;
        let mut statements = block.statements;
        statements.push(Stmt::If {
            cond: Expr::Ident(block.identifier),
            then_branch: self.and_chain(rest, id, ctx, env)?,
            else_branch: Vec::new(),
        });
        Ok(statements)
    }

    /// `false`, set to `true` by the first operand that holds
    pub fn or_block(
        &self,
        operands: Vec<Operand<'_>>,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        self.flag_block(false, env, |this, id, env| {
            this.or_chain(operands.into_iter(), id, ctx, env)
        })
    }

    fn or_chain(
        &self,
        mut rest: IntoIter<Operand<'_>>,
        id: &str,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Vec<Stmt>> {
        let Some(next) = rest.next() else {
            return Ok(Vec::new());
        };
        let block = self.operand(next, ctx, env)?;
        let mut statements = block.statements;
        statements.push(Stmt::If {
            cond: Expr::Ident(block.identifier),
            then_branch: vec![Stmt::assign(id, Expr::Bool(true))],
            else_branch: self.or_chain(rest, id, ctx, env)?,
        });
        Ok(statements)
    }

    /// Right-associative implication: `true` as soon as a premise fails,
    /// otherwise the value of the last operand
    pub fn implies_block(
        &self,
        operands: Vec<Operand<'_>>,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        self.flag_block(false, env, |this, id, env| {
            this.implies_chain(operands.into_iter(), id, ctx, env)
        })
    }

    fn implies_chain(
        &self,
        mut rest: IntoIter<Operand<'_>>,
        id: &str,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Vec<Stmt>> {
        let Some(next) = rest.next() else {
            return Ok(Vec::new());
        };
        let block = self.operand(next, ctx, env)?;
        let mut statements = block.statements;
        let value = Expr::Ident(block.identifier);
        let set = vec![Stmt::assign(id, Expr::Bool(true))];
        if rest.len() == 0 {
            statements.push(Stmt::If {
                cond: value,
                then_branch: set,
                else_branch: Vec::new(),
            });
        } else {
            statements.push(Stmt::If {
                cond: Expr::not(value),
                then_branch: set,
                else_branch: self.implies_chain(rest, id, ctx, env)?,
            });
        }
        Ok(statements)
    }

    /// Parity of the operands; every operand is evaluated
    pub fn xor_block(
        &self,
        operands: Vec<Operand<'_>>,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        self.flag_block(false, env, |this, id, env| {
            let mut statements = Vec::new();
            for operand in operands {
                let block = this.operand(operand, ctx, env)?;
                statements.extend(block.statements);
                statements.push(Stmt::If {
                    cond: Expr::Ident(block.identifier),
                    then_branch: vec![Stmt::assign(id, Expr::not(Expr::ident(id)))],
                    else_branch: Vec::new(),
                });
            }
            Ok(statements)
        })
    }

    /// Quantifier over `[-QUANTIFIER_BOUND, QUANTIFIER_BOUND]` per bound
    /// variable, as nested loops that stop at the first counterexample
    /// (`forall`) or witness (`exists`)
    pub(crate) fn quantifier_block(
        &self,
        kind: Quantifier,
        bindings: &[(String, Sort)],
        body: &Term,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        let forall = kind == Quantifier::Forall;
        let identifier = env.fresh(TMP_PREFIX)?;
        let mut scope = ctx.clone();
        let mut binders = Vec::with_capacity(bindings.len());
        for (name, sort) in bindings {
            let ty = value_type(name, sort, self.options)?;
            if ty == ValueType::Bool {
                return Err(LowerError::UnsupportedSort {
                    name: name.clone(),
                    sort: sort.to_string(),
                });
            }
            let counter = env.fresh(COUNTER_PREFIX)?;
            let var = env.fresh(TMP_PREFIX)?;
            scope.bind_local(name, var.clone(), ty);
            binders.push((counter, var, ty));
        }

        let body = self.lower(body, &scope, env)?;
        let decisive = if forall {
            Expr::not(Expr::Ident(body.identifier))
        } else {
            Expr::Ident(body.identifier)
        };
        let mut inner = body.statements;
        inner.push(Stmt::If {
            cond: decisive,
            then_branch: vec![Stmt::assign(&identifier, Expr::Bool(!forall))],
            else_branch: Vec::new(),
        });

        let guard = if forall {
            Expr::ident(&identifier)
        } else {
            Expr::not(Expr::ident(&identifier))
        };
        for (counter, var, ty) in binders.into_iter().rev() {
            let mut loop_body = vec![Stmt::Declare {
                name: var,
                ty,
                init: Some(Expr::Ident(counter.clone()).coerce(ValueType::Int, ty)),
            }];
            loop_body.extend(inner);
            inner = vec![Stmt::BoundedLoop {
                counter,
                lo: -QUANTIFIER_BOUND,
                hi: QUANTIFIER_BOUND,
                guard: guard.clone(),
                body: loop_body,
            }];
        }

        let mut statements = vec![declare_flag(&identifier, forall)];
        statements.extend(inner);
        Ok(CodeBlock {
            statements,
            identifier,
            ty: ValueType::Bool,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::CBinding;
    use crate::options::LowerOptions;
    use indexmap::IndexMap;
    use veridiff_smt::parse_term;

    fn lower(text: &str) -> LowerResult<CodeBlock> {
        let vars = IndexMap::from([
            ("p".to_string(), Sort::Bool),
            ("q".to_string(), Sort::Bool),
            ("x".to_string(), Sort::Int),
        ]);
        let term = parse_term(text, &vars).unwrap();
        let options = LowerOptions::default();
        let ctx = BindingContext::new(&vars, &IndexMap::new(), &CBinding, &options)?;
        let mut env = LoweringEnv::new(options.max_fresh_ids);
        Lowerer::new(&CBinding, &options).lower(&term, &ctx, &mut env)
    }

    fn depth(stmts: &[Stmt]) -> usize {
        stmts
            .iter()
            .map(|s| match s {
                Stmt::If {
                    then_branch,
                    else_branch,
                    ..
                } => 1 + depth(then_branch).max(depth(else_branch)),
                Stmt::BoundedLoop { body, .. } => 1 + depth(body),
                _ => 0,
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_and_nests_one_level_per_operand() {
        let block = lower("(and p q (> x 0))").unwrap();
        assert_eq!(depth(&block.statements), 3);
        assert!(matches!(
            &block.statements[0],
            Stmt::Declare { init: Some(Expr::Bool(false)), .. }
        ));
    }

    #[test]
    fn test_later_operands_live_inside_branches() {
        let block = lower("(or p (> x 0))").unwrap();
        // The flag, the first operand's value, then the conditional.
        assert_eq!(block.statements.len(), 3);
        let Stmt::If { else_branch, .. } = &block.statements[2] else {
            panic!("expected a conditional");
        };
        assert!(matches!(else_branch.last(), Some(Stmt::If { .. })));
    }

    #[test]
    fn test_xor_is_flat() {
        let block = lower("(xor p q p q)").unwrap();
        assert_eq!(depth(&block.statements), 1);
    }

    #[test]
    fn test_quantifier_nests_one_loop_per_binder() {
        let block = lower("(forall ((a Int) (b Int)) (>= (+ a b x) (- 300)))").unwrap();
        let Stmt::BoundedLoop { lo, hi, body, .. } = &block.statements[1] else {
            panic!("expected a loop");
        };
        assert_eq!((*lo, *hi), (-QUANTIFIER_BOUND, QUANTIFIER_BOUND));
        assert!(body.iter().any(|s| matches!(s, Stmt::BoundedLoop { .. })));
    }

    #[test]
    fn test_boolean_binder_is_rejected() {
        let err = lower("(exists ((b Bool)) b)").unwrap_err();
        assert!(matches!(err, LowerError::UnsupportedSort { .. }));
    }
}
