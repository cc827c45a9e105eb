//! Rendering of the IR through a language binding

use crate::binding::LanguageBinding;
use crate::ir::{declared_locals, Expr, NaryOp, Param, Stmt};

const INDENT: &str = "    ";

/// Render an expression
pub fn render_expr(binding: &dyn LanguageBinding, expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Bool(value) => binding.bool_literal(*value),
        Expr::Int(digits) => digits.clone(),
        Expr::Real(text) => binding.real_literal(text),
        Expr::Not(inner) => binding.not(&render_expr(binding, inner)),
        Expr::Neg(inner) => binding.neg(&render_expr(binding, inner)),
        Expr::Binary(op, lhs, rhs) => binding.binary(
            *op,
            &render_expr(binding, lhs),
            &render_expr(binding, rhs),
        ),
        Expr::Nary(op, operands) => render_nary(binding, *op, operands),
        Expr::Ite(cond, then, otherwise) => binding.ite(
            &render_expr(binding, cond),
            &render_expr(binding, then),
            &render_expr(binding, otherwise),
        ),
        Expr::ToReal(inner) => binding.to_real(&render_expr(binding, inner)),
        Expr::AnyFalse(operands) => {
            let rendered: Vec<String> = operands.iter().map(|e| render_expr(binding, e)).collect();
            binding.any_false(&rendered)
        }
    }
}

fn render_nary(binding: &dyn LanguageBinding, op: NaryOp, operands: &[Expr]) -> String {
    let rendered: Vec<String> = operands.iter().map(|e| render_expr(binding, e)).collect();
    let glyph = binding.nary_glyph(op);
    match (op, rendered.as_slice()) {
        (NaryOp::And, []) => binding.bool_literal(true),
        (NaryOp::Or | NaryOp::Xor, []) => binding.bool_literal(false),
        (_, []) => "0".to_string(),
        (_, [single]) => single.clone(),
        // `!=` does not chain in every target, so parity nests explicitly.
        (NaryOp::Xor, [first, rest @ ..]) => rest
            .iter()
            .fold(first.clone(), |acc, next| format!("({acc} {glyph} {next})")),
        _ => format!("({})", rendered.join(&format!(" {glyph} "))),
    }
}

fn push(out: &mut Vec<String>, depth: usize, line: String) {
    out.push(format!("{}{line}", INDENT.repeat(depth)));
}

/// Render statements at `depth` levels of indentation
pub fn render_block(
    binding: &dyn LanguageBinding,
    stmts: &[Stmt],
    depth: usize,
    out: &mut Vec<String>,
) {
    let hoisted = binding.hoists_declarations();
    for stmt in stmts {
        match stmt {
            Stmt::Declare { name, ty, init } => {
                let init = init.as_ref().map(|e| render_expr(binding, e));
                match (hoisted, init) {
                    (true, Some(init)) => push(out, depth, binding.assign(name, &init)),
                    (true, None) => {}
                    (false, init) => push(out, depth, binding.declare(name, *ty, init.as_deref())),
                }
            }
            Stmt::Assign { name, value } => {
                push(out, depth, binding.assign(name, &render_expr(binding, value)));
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                push(out, depth, binding.if_head(&render_expr(binding, cond)));
                render_block(binding, then_branch, depth + 1, out);
                if !else_branch.is_empty() {
                    push(out, depth, binding.else_head());
                    render_block(binding, else_branch, depth + 1, out);
                }
                push(out, depth, binding.block_end());
            }
            Stmt::BoundedLoop {
                counter,
                lo,
                hi,
                guard,
                body,
            } => {
                let guard = render_expr(binding, guard);
                for line in binding.loop_head(counter, *lo, *hi, &guard) {
                    push(out, depth, line);
                }
                render_block(binding, body, depth + 1, out);
                if let Some(step) = binding.loop_step(counter) {
                    push(out, depth + 1, step);
                }
                push(out, depth, binding.block_end());
            }
            Stmt::Call {
                target,
                ty,
                routine,
                args,
            } => {
                let args: Vec<String> = args.iter().map(|e| render_expr(binding, e)).collect();
                push(out, depth, binding.call(target, *ty, routine, &args));
            }
            Stmt::Assert(cond) => push(out, depth, binding.assert(&render_expr(binding, cond))),
        }
    }
}

/// Render a complete routine; `result` is returned from helper routines
/// and `ensures` is the expression it is promised to equal
pub fn render_routine(
    binding: &dyn LanguageBinding,
    name: &str,
    params: &[Param],
    body: &[Stmt],
    result: Option<&str>,
    ensures: Option<&Expr>,
) -> Vec<String> {
    let ensures = ensures.map(|e| render_expr(binding, e));
    let mut out = binding.routine_head(name, params, result.is_some(), ensures.as_deref());
    if binding.hoists_declarations() {
        for (local, ty) in declared_locals(body) {
            push(&mut out, 1, binding.hoisted_declare(&local, ty));
        }
    }
    render_block(binding, body, 1, &mut out);
    if let Some(result) = result {
        push(&mut out, 1, binding.routine_return(result));
    }
    out.extend(binding.routine_end());
    out
}
