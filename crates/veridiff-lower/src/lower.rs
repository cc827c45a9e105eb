//! Generic CodeBlock lowering
//!
//! [`Lowerer::lower`] turns one term into a [`CodeBlock`]: statements that
//! compute the term's value, ending in the declaration of a fresh
//! identifier holding it. The lowerer is the same for every statement
//! target; the binding only decides between statement and expression
//! forms for conditionals and implications.

use crate::binding::{ConditionalForm, ImplicationForm, LanguageBinding};
use crate::blocks::Operand;
use crate::context::{value_type, BindingContext, TMP_PREFIX};
use crate::env::LoweringEnv;
use crate::error::{LowerError, LowerResult};
use crate::ir::{BinOp, CodeBlock, Expr, NaryOp, Stmt, ValueType};
use crate::options::LowerOptions;
use veridiff_smt::{Sort, Term};

/// A lowered operand: its value expression and type
pub(crate) type Operands = Vec<(Expr, ValueType)>;

pub(crate) fn check_arity(
    op: &str,
    actual: usize,
    ok: bool,
    expected: &'static str,
) -> LowerResult<()> {
    if ok {
        Ok(())
    } else {
        Err(LowerError::Arity {
            op: op.to_string(),
            expected,
            actual,
        })
    }
}

/// Expression and type of a literal
pub(crate) fn literal(text: &str, sort: &Sort, options: &LowerOptions) -> LowerResult<(Expr, ValueType)> {
    match sort {
        Sort::Bool => Ok((Expr::Bool(text == "true"), ValueType::Bool)),
        Sort::Int if options.real_mode => Ok((Expr::Real(format!("{text}.0")), ValueType::Real)),
        Sort::Int => Ok((Expr::Int(text.to_string()), ValueType::Int)),
        Sort::Real if text.contains('.') => Ok((Expr::Real(text.to_string()), ValueType::Real)),
        Sort::Real => Ok((Expr::Real(format!("{text}.0")), ValueType::Real)),
        Sort::Named(other) => Err(LowerError::UnsupportedSort {
            name: text.to_string(),
            sort: other.clone(),
        }),
    }
}

fn common_type(operands: &Operands) -> ValueType {
    if operands.iter().any(|(_, ty)| *ty == ValueType::Real) {
        ValueType::Real
    } else {
        operands.first().map_or(ValueType::Int, |(_, ty)| *ty)
    }
}

/// Conjunction of `op` over every pair of operands
pub(crate) fn pairwise(op: BinOp, operands: Operands) -> Expr {
    let target = common_type(&operands);
    let exprs: Vec<Expr> = operands
        .into_iter()
        .map(|(e, ty)| e.coerce(ty, target))
        .collect();
    let mut pairs = Vec::new();
    for (i, lhs) in exprs.iter().enumerate() {
        for rhs in &exprs[i + 1..] {
            pairs.push(Expr::binary(op, lhs.clone(), rhs.clone()));
        }
    }
    Expr::and_all(pairs)
}

/// `+`, `-` (unary or n-ary) and `*` over operands of result type `ty`
pub(crate) fn arithmetic(op: &str, operands: Operands, ty: ValueType) -> LowerResult<Expr> {
    let mut exprs: Vec<Expr> = operands
        .into_iter()
        .map(|(e, from)| e.coerce(from, ty))
        .collect();
    let nary = match op {
        "+" => NaryOp::Add,
        "*" => NaryOp::Mul,
        "-" if exprs.len() == 1 => return Ok(Expr::Neg(Box::new(exprs.remove(0)))),
        "-" => NaryOp::Sub,
        other => return Err(LowerError::UnsupportedOperator(other.to_string())),
    };
    Ok(Expr::Nary(nary, exprs))
}

/// Guard and guarded value of a division; the guard holds when no
/// divisor is zero
pub(crate) fn division(op: BinOp, operands: Operands, ty: ValueType) -> LowerResult<(Expr, Expr)> {
    let exprs: Vec<Expr> = operands
        .into_iter()
        .map(|(e, from)| e.coerce(from, ty))
        .collect();
    let Some((dividend, divisors)) = exprs.split_first() else {
        return Err(LowerError::Arity {
            op: "div".to_string(),
            expected: "at least 2",
            actual: 0,
        });
    };
    let guard = Expr::and_all(
        divisors
            .iter()
            .map(|d| Expr::binary(BinOp::Ne, d.clone(), Expr::zero(ty)))
            .collect(),
    );
    let value = divisors
        .iter()
        .cloned()
        .fold(dividend.clone(), |acc, d| Expr::binary(op, acc, d));
    Ok((guard, value))
}

/// Condition and branches of `abs`
pub(crate) fn absolute(operand: Expr, ty: ValueType) -> (Expr, Expr, Expr) {
    let cond = Expr::binary(BinOp::Ge, operand.clone(), Expr::zero(ty));
    let negated = Expr::Neg(Box::new(operand.clone()));
    (cond, operand, negated)
}

/// Statement-target lowerer
pub struct Lowerer<'a> {
    pub(crate) binding: &'a dyn LanguageBinding,
    pub(crate) options: &'a LowerOptions,
}

impl<'a> Lowerer<'a> {
    #[must_use]
    pub fn new(binding: &'a dyn LanguageBinding, options: &'a LowerOptions) -> Self {
        Self { binding, options }
    }

    /// Lower `term` under `ctx`
    pub fn lower(
        &self,
        term: &Term,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        match term {
            Term::Labeled { inner, .. } => self.lower(inner, ctx, env),
            Term::Var { name, .. } => {
                let binding = ctx.resolve(name)?.clone();
                self.value(env, binding.ty, Vec::new(), Expr::Ident(binding.ident))
            }
            Term::Const { literal: text, sort } => {
                let (expr, ty) = literal(text, sort, self.options)?;
                self.value(env, ty, Vec::new(), expr)
            }
            Term::Let { bindings, body } => self.lower_let(bindings, body, ctx, env),
            Term::Quant {
                kind,
                bindings,
                body,
            } => self.quantifier_block(*kind, bindings, body, ctx, env),
            Term::App { op, args, sort } => self.lower_app(term, op, args, sort, ctx, env),
        }
    }

    /// Declare a fresh identifier initialized with `value` after `statements`
    pub(crate) fn value(
        &self,
        env: &mut LoweringEnv,
        ty: ValueType,
        mut statements: Vec<Stmt>,
        value: Expr,
    ) -> LowerResult<CodeBlock> {
        let identifier = env.fresh(TMP_PREFIX)?;
        statements.push(Stmt::Declare {
            name: identifier.clone(),
            ty,
            init: Some(value),
        });
        Ok(CodeBlock {
            statements,
            identifier,
            ty,
        })
    }

    /// A value chosen by `cond`, in the binding's conditional form
    pub(crate) fn conditional(
        &self,
        env: &mut LoweringEnv,
        mut statements: Vec<Stmt>,
        ty: ValueType,
        cond: Expr,
        then: Expr,
        otherwise: Expr,
    ) -> LowerResult<CodeBlock> {
        match self.binding.conditional_form() {
            ConditionalForm::Expression => {
                self.value(env, ty, statements, Expr::ite(cond, then, otherwise))
            }
            ConditionalForm::Statement => {
                let identifier = env.fresh(TMP_PREFIX)?;
                statements.push(Stmt::Declare {
                    name: identifier.clone(),
                    ty,
                    init: None,
                });
                statements.push(Stmt::If {
                    cond,
                    then_branch: vec![Stmt::assign(&identifier, then)],
                    else_branch: vec![Stmt::assign(&identifier, otherwise)],
                });
                Ok(CodeBlock {
                    statements,
                    identifier,
                    ty,
                })
            }
        }
    }

    /// Lower each argument in order, collecting their statements
    pub(crate) fn lower_operands(
        &self,
        args: &[Term],
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<(Vec<Stmt>, Operands)> {
        let mut statements = Vec::new();
        let mut operands = Vec::with_capacity(args.len());
        for arg in args {
            let block = self.lower(arg, ctx, env)?;
            statements.extend(block.statements);
            operands.push((Expr::Ident(block.identifier), block.ty));
        }
        Ok((statements, operands))
    }

    fn lower_app(
        &self,
        term: &Term,
        op: &str,
        args: &[Term],
        sort: &Sort,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        let n = args.len();
        match op {
            "ite" => {
                check_arity(op, n, n == 3, "3")?;
                let ty = value_type(op, sort, self.options)?;
                let (statements, mut operands) = self.lower_operands(args, ctx, env)?;
                let (otherwise, else_ty) = operands.remove(2);
                let (then, then_ty) = operands.remove(1);
                let (cond, _) = operands.remove(0);
                self.conditional(
                    env,
                    statements,
                    ty,
                    cond,
                    then.coerce(then_ty, ty),
                    otherwise.coerce(else_ty, ty),
                )
            }
            "not" => {
                check_arity(op, n, n == 1, "1")?;
                let operand = self.lower(&args[0], ctx, env)?;
                let negated = Expr::not(Expr::Ident(operand.identifier));
                self.value(env, ValueType::Bool, operand.statements, negated)
            }
            "=>" => {
                check_arity(op, n, n >= 1, "at least 1")?;
                match self.binding.implication_form() {
                    ImplicationForm::ShortCircuit => {
                        self.implies_block(args.iter().map(Operand::Term).collect(), ctx, env)
                    }
                    ImplicationForm::Expression => {
                        let (statements, operands) = self.lower_operands(args, ctx, env)?;
                        let mut exprs = operands.into_iter().map(|(e, _)| e).rev();
                        let consequent = exprs.next().unwrap_or(Expr::Bool(true));
                        let chain = exprs.fold(consequent, |acc, premise| {
                            Expr::binary(BinOp::Implies, premise, acc)
                        });
                        self.value(env, ValueType::Bool, statements, chain)
                    }
                }
            }
            "and" => self.and_block(args.iter().map(Operand::Term).collect(), ctx, env),
            "or" => self.or_block(args.iter().map(Operand::Term).collect(), ctx, env),
            "xor" => self.xor_block(args.iter().map(Operand::Term).collect(), ctx, env),
            "+" | "-" | "*" => {
                check_arity(op, n, n >= 1, "at least 1")?;
                let ty = value_type(op, sort, self.options)?;
                let (statements, operands) = self.lower_operands(args, ctx, env)?;
                let expr = arithmetic(op, operands, ty)?;
                self.value(env, ty, statements, expr)
            }
            "abs" => {
                check_arity(op, n, n == 1, "1")?;
                let operand = self.lower(&args[0], ctx, env)?;
                let ty = operand.ty;
                let (cond, then, otherwise) = absolute(Expr::Ident(operand.identifier), ty);
                self.conditional(env, operand.statements, ty, cond, then, otherwise)
            }
            "div" => self.lower_division(term, BinOp::IntDiv, args, sort, ctx, env),
            "mod" => self.lower_division(term, BinOp::IntMod, args, sort, ctx, env),
            "/" => self.lower_division(term, BinOp::RealDiv, args, sort, ctx, env),
            "to_real" => {
                check_arity(op, n, n == 1, "1")?;
                let operand = self.lower(&args[0], ctx, env)?;
                let expr = Expr::Ident(operand.identifier).coerce(operand.ty, ValueType::Real);
                self.value(env, ValueType::Real, operand.statements, expr)
            }
            _ => match BinOp::comparison(op) {
                Some(cmp) => {
                    check_arity(op, n, n >= 2, "at least 2")?;
                    let (statements, operands) = self.lower_operands(args, ctx, env)?;
                    self.value(env, ValueType::Bool, statements, pairwise(cmp, operands))
                }
                None => Err(LowerError::UnsupportedOperator(op.to_string())),
            },
        }
    }

    /// Division guarded by a sentinel parameter shared by identical terms
    fn lower_division(
        &self,
        term: &Term,
        op: BinOp,
        args: &[Term],
        sort: &Sort,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        let name = term.op().unwrap_or("/");
        if op != BinOp::RealDiv && self.options.real_mode {
            return Err(LowerError::UnsupportedOperator(format!(
                "{name} in real mode"
            )));
        }
        check_arity(name, args.len(), args.len() >= 2, "at least 2")?;
        let ty = value_type(name, sort, self.options)?;
        let (statements, operands) = self.lower_operands(args, ctx, env)?;
        let sentinel = env.division_sentinel(ctx.division_key(term), ty)?;
        let (guard, value) = division(op, operands, ty)?;
        self.conditional(env, statements, ty, guard, value, Expr::Ident(sentinel))
    }

    /// Parallel `let`: bound terms see the incoming context, the body sees
    /// a copy extended with the new bindings
    fn lower_let(
        &self,
        bindings: &[(String, Term)],
        body: &Term,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<CodeBlock> {
        let mut scope = ctx.clone();
        let mut statements = Vec::new();
        for (name, bound) in bindings {
            let block = self.lower(bound, ctx, env)?;
            statements.extend(block.statements);
            scope.bind_local(name, block.identifier, block.ty);
        }
        let body = self.lower(body, &scope, env)?;
        statements.extend(body.statements);
        self.value(env, body.ty, statements, Expr::Ident(body.identifier))
    }
}
