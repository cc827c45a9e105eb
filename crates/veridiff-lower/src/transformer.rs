//! Formula-to-program transformation
//!
//! A [`Transformer`] wraps one language binding and turns a formula (its
//! assertions, free variables and defined symbols) into a complete
//! program whose verification outcome mirrors the formula's
//! satisfiability.

use crate::binding::{Language, LanguageBinding};
use crate::blocks::Operand;
use crate::context::{BindingContext, CHECK_ROUTINE, ROUTINE_PREFIX, TMP_PREFIX};
use crate::env::LoweringEnv;
use crate::error::LowerResult;
use crate::inline::{InlineLowerer, Scope};
use crate::ir::{CodeBlock, Expr, Param, Routine, Stmt, ValueType};
use crate::lang::binding_for;
use crate::lower::Lowerer;
use crate::options::{LowerOptions, OracleStyle};
use crate::render::{render_expr, render_routine};
use indexmap::IndexMap;
use tracing::debug;
use veridiff_smt::{Script, Sort, Term};

/// The parts of a script the transformation reads
#[derive(Debug, Clone, Default)]
pub struct Formula {
    pub assertions: Vec<Term>,
    pub free_vars: IndexMap<String, Sort>,
    pub defined_vars: IndexMap<String, (Sort, Term)>,
}

impl Formula {
    #[must_use]
    pub fn from_script(script: &Script) -> Self {
        Self {
            assertions: script.final_assertions().into_iter().cloned().collect(),
            free_vars: script.free_vars(),
            defined_vars: script.defined_vars(),
        }
    }
}

/// Source text of a generated program plus what produced it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProgram {
    pub language: Language,
    pub extension: &'static str,
    pub source: String,
    /// Inputs of the check routine: free variables, then sentinels
    pub params: Vec<Param>,
    /// Division sentinels, a suffix of `params`
    pub sentinels: Vec<Param>,
    /// Fresh identifiers spent
    pub fresh_ids: usize,
}

pub struct Transformer {
    binding: Box<dyn LanguageBinding>,
    options: LowerOptions,
}

impl Transformer {
    #[must_use]
    pub fn new(language: Language, options: LowerOptions) -> Self {
        Self::with_binding(binding_for(language), options)
    }

    #[must_use]
    pub fn with_binding(binding: Box<dyn LanguageBinding>, options: LowerOptions) -> Self {
        Self { binding, options }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.binding.language()
    }

    #[must_use]
    pub fn options(&self) -> &LowerOptions {
        &self.options
    }

    pub fn transform_script(&self, script: &Script) -> LowerResult<GeneratedProgram> {
        self.transform(&Formula::from_script(script))
    }

    pub fn transform(&self, formula: &Formula) -> LowerResult<GeneratedProgram> {
        self.options.validate()?;
        let binding = self.binding.as_ref();
        let mut env = LoweringEnv::new(self.options.max_fresh_ids);
        let ctx = BindingContext::new(
            &formula.free_vars,
            &formula.defined_vars,
            binding,
            &self.options,
        )?;

        let lines = if binding.supports_statements() {
            self.statement_program(formula, ctx.clone(), &mut env)?
        } else {
            self.query_program(formula, &ctx, &mut env)?
        };

        let sentinels: Vec<Param> = env.sentinels().cloned().collect();
        let mut params = ctx.params();
        params.extend(sentinels.iter().cloned());
        let mut source = lines.join("\n");
        source.push('\n');
        debug!(
            language = %binding.language(),
            fresh_ids = env.issued(),
            sentinels = sentinels.len(),
            "generated program"
        );
        Ok(GeneratedProgram {
            language: binding.language(),
            extension: binding.file_extension(),
            source,
            params,
            sentinels,
            fresh_ids: env.issued(),
        })
    }

    /// Lower defined symbols in declaration order, binding each in `ctx`
    fn prologue(
        &self,
        lowerer: &Lowerer<'_>,
        formula: &Formula,
        ctx: &mut BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        for (name, (_, term)) in &formula.defined_vars {
            let block = lowerer.lower(term, ctx, env)?;
            statements.extend(block.statements);
            ctx.bind_defined(name, block.identifier, block.ty);
        }
        Ok(statements)
    }

    fn statement_program(
        &self,
        formula: &Formula,
        base: BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Vec<String>> {
        let binding = self.binding.as_ref();
        let lowerer = Lowerer::new(binding, &self.options);
        let method_mode = self.options.method_mode && binding.supports_routines();
        if self.options.method_mode && !method_mode {
            debug!(language = %binding.language(), "no helper routines, using a single routine");
        }

        let body = if method_mode {
            let contracts = InlineLowerer::new(binding, &self.options);
            let defined = if binding.needs_postconditions() {
                Some(self.defined_scope(&contracts, formula, &base, env)?)
            } else {
                None
            };
            for (i, assertion) in formula.assertions.iter().enumerate() {
                let mut ctx = base.clone();
                let mut routine_body = self.prologue(&lowerer, formula, &mut ctx, env)?;
                let block = lowerer.lower(assertion, &ctx, env)?;
                routine_body.extend(block.statements);
                let postcondition = match &defined {
                    Some(scope) => Some(contracts.lower_scoped(assertion, &base, scope, env)?.0),
                    None => None,
                };
                env.add_routine(Routine {
                    name: format!("{ROUTINE_PREFIX}{i}"),
                    body: routine_body,
                    result: block.identifier,
                    postcondition,
                });
            }
            // Call arguments need every sentinel, so calls are built last.
            let args: Vec<Expr> = all_params(&base, env)
                .into_iter()
                .map(|p| Expr::Ident(p.name))
                .collect();
            let names: Vec<String> = env.routines().iter().map(|r| r.name.clone()).collect();
            let mut calls = Vec::with_capacity(names.len());
            for routine in names {
                let target = env.fresh(TMP_PREFIX)?;
                calls.push(CodeBlock {
                    statements: vec![Stmt::Call {
                        target: target.clone(),
                        ty: ValueType::Bool,
                        routine,
                        args: args.clone(),
                    }],
                    identifier: target,
                    ty: ValueType::Bool,
                });
            }
            self.oracle(&lowerer, calls, &base, env)?
        } else {
            let mut ctx = base.clone();
            let mut body = self.prologue(&lowerer, formula, &mut ctx, env)?;
            match self.options.oracle_style {
                OracleStyle::Refutation => {
                    let operands = formula.assertions.iter().map(Operand::Term).collect();
                    let block = lowerer.and_block(operands, &ctx, env)?;
                    body.extend(block.statements);
                    body.push(Stmt::Assert(Expr::not(Expr::Ident(block.identifier))));
                }
                OracleStyle::AnyFalse => {
                    let mut results = Vec::with_capacity(formula.assertions.len());
                    for assertion in &formula.assertions {
                        results.push(lowerer.lower(assertion, &ctx, env)?);
                    }
                    body.extend(self.oracle(&lowerer, results, &ctx, env)?);
                }
            }
            body
        };

        let params = all_params(&base, env);
        let mut lines = binding.preamble();
        for routine in env.routines() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(render_routine(
                binding,
                &routine.name,
                &params,
                &routine.body,
                Some(&routine.result),
                routine.postcondition.as_ref(),
            ));
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(render_routine(binding, CHECK_ROUTINE, &params, &body, None, None));
        let entry = binding.entry_point(CHECK_ROUTINE, &params);
        if !entry.is_empty() {
            lines.push(String::new());
            lines.extend(entry);
        }
        Ok(lines)
    }

    /// Final assertion over already lowered per-assertion results
    fn oracle(
        &self,
        lowerer: &Lowerer<'_>,
        results: Vec<CodeBlock>,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Vec<Stmt>> {
        match self.options.oracle_style {
            OracleStyle::Refutation => {
                let operands = results.into_iter().map(Operand::Lowered).collect();
                let block = lowerer.and_block(operands, ctx, env)?;
                let mut statements = block.statements;
                statements.push(Stmt::Assert(Expr::not(Expr::Ident(block.identifier))));
                Ok(statements)
            }
            OracleStyle::AnyFalse => {
                let mut statements = Vec::new();
                let mut values = Vec::with_capacity(results.len());
                for block in results {
                    statements.extend(block.statements);
                    values.push(Expr::Ident(block.identifier));
                }
                let claim = if values.is_empty() {
                    Expr::Bool(false)
                } else {
                    Expr::AnyFalse(values)
                };
                statements.push(Stmt::Assert(claim));
                Ok(statements)
            }
        }
    }

    /// Defined symbols as substitutions for expression lowering
    fn defined_scope(
        &self,
        lowerer: &InlineLowerer<'_>,
        formula: &Formula,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Scope> {
        let mut scope = Scope::new();
        for (name, (_, term)) in &formula.defined_vars {
            let value = lowerer.lower_scoped(term, ctx, &scope, env)?;
            scope.insert(name.clone(), value);
        }
        Ok(scope)
    }

    fn query_program(
        &self,
        formula: &Formula,
        ctx: &BindingContext,
        env: &mut LoweringEnv,
    ) -> LowerResult<Vec<String>> {
        let binding = self.binding.as_ref();
        let lowerer = InlineLowerer::new(binding, &self.options);
        let scope = self.defined_scope(&lowerer, formula, ctx, env)?;
        let mut conditions = Vec::with_capacity(formula.assertions.len());
        for assertion in &formula.assertions {
            conditions.push(lowerer.lower_scoped(assertion, ctx, &scope, env)?.0);
        }
        let condition = render_expr(binding, &Expr::and_all(conditions));
        let mut lines = binding.preamble();
        lines.push(binding.query(&condition));
        Ok(lines)
    }
}

fn all_params(ctx: &BindingContext, env: &LoweringEnv) -> Vec<Param> {
    let mut params = ctx.params();
    params.extend(env.sentinels().cloned());
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridiff_smt::parse_script;

    fn generate(language: Language, options: LowerOptions, text: &str) -> GeneratedProgram {
        let script = parse_script(text).unwrap();
        Transformer::new(language, options)
            .transform_script(&script)
            .unwrap()
    }

    const DIV_SCRIPT: &str = "(declare-fun x () Int) (declare-fun y () Int) \
                              (assert (> (div x y) 0)) (assert (< x 10)) (check-sat)";

    #[test]
    fn test_params_end_with_sentinels() {
        let program = generate(Language::C, LowerOptions::default(), DIV_SCRIPT);
        let names: Vec<&str> = program.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(&names[..2], &["x", "y"]);
        assert!(names[2].starts_with("div"));
        assert_eq!(program.sentinels.len(), 1);
    }

    #[test]
    fn test_c_program_shape() {
        let program = generate(Language::C, LowerOptions::default(), DIV_SCRIPT);
        assert_eq!(program.extension, "c");
        assert!(program.source.contains("void check(long x, long y, long div"));
        assert!(program.source.contains("int main(void)"));
        assert!(program.source.contains("assert(!tmp"));
    }

    #[test]
    fn test_method_mode_emits_one_routine_per_assertion() {
        let options = LowerOptions {
            method_mode: true,
            ..LowerOptions::default()
        };
        let program = generate(Language::Boogie, options, DIV_SCRIPT);
        assert!(program.source.contains("procedure {:inline 1} formula0("));
        assert!(program.source.contains("procedure {:inline 1} formula1("));
        assert!(program.source.contains(":= formula0(x, y, div"));
    }

    #[test]
    fn test_dafny_method_mode_states_results_as_postconditions() {
        let options = LowerOptions {
            method_mode: true,
            ..LowerOptions::default()
        };
        let program = generate(Language::Dafny, options, DIV_SCRIPT);
        let source = &program.source;
        assert!(source.contains("method {:verify false} formula0(x: int, y: int, div"));
        assert!(source.contains("  ensures ret == ((if (y != 0) then (x / y) else div"));
        assert!(source.contains("  ensures ret == (x < 10)"));
        assert!(source.contains(":= formula1(x, y, div"));
        assert!(source.contains("method check("));
        // Both the body and the postcondition reuse the single sentinel.
        assert_eq!(program.sentinels.len(), 1);
    }

    #[test]
    fn test_dafny_method_mode_substitutes_defined_symbols() {
        let options = LowerOptions {
            method_mode: true,
            ..LowerOptions::default()
        };
        let program = generate(
            Language::Dafny,
            options,
            "(declare-fun x () Int) (define-fun y () Int (+ x 1)) (assert (> y x)) (check-sat)",
        );
        assert!(program.source.contains("  ensures ret == ((x + 1) > x)"));
    }

    #[test]
    fn test_method_mode_falls_back_for_sql() {
        let options = LowerOptions {
            method_mode: true,
            ..LowerOptions::default()
        };
        let program = generate(Language::Sql, options, DIV_SCRIPT);
        assert!(!program.source.contains("formula0"));
    }

    #[test]
    fn test_popped_assertions_are_not_lowered() {
        let program = generate(
            Language::C,
            LowerOptions::default(),
            "(declare-fun x () Int) (push 1) (assert (< x 17)) (check-sat) (pop 1) \
             (assert (> x 23)) (check-sat)",
        );
        assert!(program.source.contains("= 23;"));
        assert!(!program.source.contains("= 17;"));
    }

    #[test]
    fn test_any_false_oracle() {
        let options = LowerOptions {
            oracle_style: OracleStyle::AnyFalse,
            ..LowerOptions::default()
        };
        let program = generate(Language::Dafny, options, DIV_SCRIPT);
        assert!(program.source.contains("false in multiset{"));
    }

    #[test]
    fn test_no_assertions_is_trivially_satisfiable() {
        let options = LowerOptions {
            oracle_style: OracleStyle::AnyFalse,
            ..LowerOptions::default()
        };
        let program = generate(Language::C, options, "(declare-fun x () Int) (check-sat)");
        assert!(program.source.contains("assert(false);"));
    }

    #[test]
    fn test_defined_symbols_become_locals() {
        let program = generate(
            Language::C,
            LowerOptions::default(),
            "(declare-fun x () Int) (define-fun y () Int (+ x 1)) (assert (> y x)) (check-sat)",
        );
        let names: Vec<&str> = program.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["x"]);
    }

    #[test]
    fn test_sql_query() {
        let program = generate(Language::Sql, LowerOptions::default(), DIV_SCRIPT);
        assert_eq!(
            program.source,
            "SELECT * FROM db_table WHERE \
             (((CASE WHEN (y <> 0) THEN (x DIV y) ELSE div0 END) > 0) AND (x < 10))\n"
        );
    }

    #[test]
    fn test_fresh_ids_are_reported() {
        let program = generate(Language::C, LowerOptions::default(), DIV_SCRIPT);
        assert!(program.fresh_ids > program.sentinels.len());
    }
}
