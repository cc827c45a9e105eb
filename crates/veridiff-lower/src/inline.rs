//! Expression-only lowering for targets without statements
//!
//! The whole term becomes one expression. `let` is substituted, division
//! guards become conditional expressions over the same sentinels the
//! statement lowerer uses, and quantifiers are rejected.

use crate::binding::LanguageBinding;
use crate::context::{value_type, BindingContext};
use crate::env::LoweringEnv;
use crate::error::{LowerError, LowerResult};
use crate::ir::{BinOp, Expr, NaryOp, ValueType};
use crate::lower::{absolute, arithmetic, check_arity, division, literal, pairwise, Operands};
use crate::options::LowerOptions;
use std::collections::HashMap;
use veridiff_smt::{Sort, Term};

/// Substitutions in effect: `let` names and defined symbols
pub(crate) type Scope = HashMap<String, (Expr, ValueType)>;

pub struct InlineLowerer<'a> {
    binding: &'a dyn LanguageBinding,
    options: &'a LowerOptions,
}

impl<'a> InlineLowerer<'a> {
    #[must_use]
    pub fn new(binding: &'a dyn LanguageBinding, options: &'a LowerOptions) -> Self {
        Self { binding, options }
    }

    /// Lower `term` to a single expression and its type
    pub fn lower(
        &self,
        term: &Term,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<(Expr, ValueType)> {
        self.lower_scoped(term, ctx, &Scope::new(), env)
    }

    pub(crate) fn lower_scoped(
        &self,
        term: &Term,
        ctx: &BindingContext,
        scope: &Scope,
        env: &mut LoweringEnv,
    ) -> LowerResult<(Expr, ValueType)> {
        match term {
            Term::Labeled { inner, .. } => self.lower_scoped(inner, ctx, scope, env),
            Term::Var { name, .. } => match scope.get(name) {
                Some(value) => Ok(value.clone()),
                None => {
                    let binding = ctx.resolve(name)?;
                    Ok((Expr::Ident(binding.ident.clone()), binding.ty))
                }
            },
            Term::Const { literal: text, sort } => literal(text, sort, self.options),
            Term::Let { bindings, body } => {
                let mut inner = scope.clone();
                for (name, bound) in bindings {
                    let value = self.lower_scoped(bound, ctx, scope, env)?;
                    inner.insert(name.clone(), value);
                }
                self.lower_scoped(body, ctx, &inner, env)
            }
            Term::Quant { kind, .. } => Err(LowerError::UnsupportedConstruct {
                construct: format!("`{}` quantifier", kind.keyword()),
                language: self.binding.language(),
            }),
            Term::App { op, args, sort } => self.lower_app(term, op, args, sort, ctx, scope, env),
        }
    }

    fn operands(
        &self,
        args: &[Term],
        ctx: &BindingContext,
        scope: &Scope,
        env: &mut LoweringEnv,
    ) -> LowerResult<Operands> {
        args.iter()
            .map(|arg| self.lower_scoped(arg, ctx, scope, env))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_app(
        &self,
        term: &Term,
        op: &str,
        args: &[Term],
        sort: &Sort,
        ctx: &BindingContext,
        scope: &Scope,
        env: &mut LoweringEnv,
    ) -> LowerResult<(Expr, ValueType)> {
        let n = args.len();
        let mut operands = self.operands(args, ctx, scope, env)?;
        let exprs = |operands: Operands| operands.into_iter().map(|(e, _)| e).collect::<Vec<_>>();
        match op {
            "ite" => {
                check_arity(op, n, n == 3, "3")?;
                let ty = value_type(op, sort, self.options)?;
                let (otherwise, else_ty) = operands.remove(2);
                let (then, then_ty) = operands.remove(1);
                let (cond, _) = operands.remove(0);
                Ok((
                    Expr::ite(cond, then.coerce(then_ty, ty), otherwise.coerce(else_ty, ty)),
                    ty,
                ))
            }
            "not" => {
                check_arity(op, n, n == 1, "1")?;
                Ok((Expr::not(operands.remove(0).0), ValueType::Bool))
            }
            "=>" => {
                check_arity(op, n, n >= 1, "at least 1")?;
                let mut rev = exprs(operands).into_iter().rev();
                let consequent = rev.next().unwrap_or(Expr::Bool(true));
                let chain = rev.fold(consequent, |acc, premise| {
                    Expr::binary(BinOp::Implies, premise, acc)
                });
                Ok((chain, ValueType::Bool))
            }
            "and" => Ok((Expr::Nary(NaryOp::And, exprs(operands)), ValueType::Bool)),
            "or" => Ok((Expr::Nary(NaryOp::Or, exprs(operands)), ValueType::Bool)),
            "xor" => Ok((Expr::Nary(NaryOp::Xor, exprs(operands)), ValueType::Bool)),
            "+" | "-" | "*" => {
                check_arity(op, n, n >= 1, "at least 1")?;
                let ty = value_type(op, sort, self.options)?;
                Ok((arithmetic(op, operands, ty)?, ty))
            }
            "abs" => {
                check_arity(op, n, n == 1, "1")?;
                let (operand, ty) = operands.remove(0);
                let (cond, then, otherwise) = absolute(operand, ty);
                Ok((Expr::ite(cond, then, otherwise), ty))
            }
            "div" | "mod" | "/" => {
                let div_op = match op {
                    "div" => BinOp::IntDiv,
                    "mod" => BinOp::IntMod,
                    _ => BinOp::RealDiv,
                };
                if div_op != BinOp::RealDiv && self.options.real_mode {
                    return Err(LowerError::UnsupportedOperator(format!("{op} in real mode")));
                }
                check_arity(op, n, n >= 2, "at least 2")?;
                let ty = value_type(op, sort, self.options)?;
                let mut key = ctx.division_key(term);
                for name in term.free_symbols() {
                    if let Some((value, _)) = scope.get(name) {
                        key.push_str(&format!(" {name}={value:?}"));
                    }
                }
                let sentinel = env.division_sentinel(key, ty)?;
                let (guard, value) = division(div_op, operands, ty)?;
                Ok((Expr::ite(guard, value, Expr::Ident(sentinel)), ty))
            }
            "to_real" => {
                check_arity(op, n, n == 1, "1")?;
                let (operand, ty) = operands.remove(0);
                Ok((operand.coerce(ty, ValueType::Real), ValueType::Real))
            }
            _ => match BinOp::comparison(op) {
                Some(cmp) => {
                    check_arity(op, n, n >= 2, "at least 2")?;
                    Ok((pairwise(cmp, operands), ValueType::Bool))
                }
                None => Err(LowerError::UnsupportedOperator(op.to_string())),
            },
        }
    }
}
