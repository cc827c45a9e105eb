//! Lowered code computes the same values as the terms it came from

mod common;

use common::{eval_term, lower, run_block, Interpreter, Value};
use indexmap::IndexMap;
use std::collections::HashMap;
use veridiff_lower::lang::{BoogieBinding, CBinding, DafnyBinding};
use veridiff_lower::{
    BindingContext, InlineLowerer, Language, LanguageBinding, LowerOptions, Lowerer, LoweringEnv,
    Transformer,
};
use veridiff_smt::{parse_script, parse_term, Sort, Term};

fn bindings() -> [&'static dyn LanguageBinding; 3] {
    [&CBinding, &DafnyBinding, &BoogieBinding]
}

fn int_vars() -> IndexMap<String, Sort> {
    IndexMap::from([
        ("x".to_string(), Sort::Int),
        ("y".to_string(), Sort::Int),
    ])
}

fn ints(x: i128, y: i128) -> HashMap<String, Value> {
    HashMap::from([
        ("x".to_string(), Value::Int(x)),
        ("y".to_string(), Value::Int(y)),
    ])
}

fn eval_lowered(binding: &dyn LanguageBinding, text: &str, x: i128, y: i128) -> Value {
    let vars = int_vars();
    let term = parse_term(text, &vars).unwrap();
    let (block, env) = lower(binding, &vars, &term);
    run_block(&block, &env, &ints(x, y), 7)
}

// ============================================================================
// Boolean connectives
// ============================================================================

#[test]
fn test_connective_truth_tables() {
    for n in 1..=4usize {
        let vars: IndexMap<String, Sort> = (0..n).map(|i| (format!("b{i}"), Sort::Bool)).collect();
        let operands: Vec<Term> = (0..n).map(|i| Term::var(format!("b{i}"), Sort::Bool)).collect();
        for op in ["and", "or", "xor", "=>"] {
            let term = Term::app(op, operands.clone());
            for binding in bindings() {
                let (block, env) = lower(binding, &vars, &term);
                for mask in 0..(1u32 << n) {
                    let inputs: HashMap<String, Value> = (0..n)
                        .map(|i| (format!("b{i}"), Value::Bool(mask & (1 << i) != 0)))
                        .collect();
                    let expected = eval_term(&term, &inputs).unwrap();
                    assert_eq!(
                        run_block(&block, &env, &inputs, 0),
                        expected,
                        "{op} over {n} operands, mask {mask:b}, {:?}",
                        binding.language()
                    );
                }
            }
        }
    }
}

#[test]
fn test_implication_is_right_associative() {
    let vars: IndexMap<String, Sort> = ["a", "b", "c"]
        .iter()
        .map(|n| (n.to_string(), Sort::Bool))
        .collect();
    let term = parse_term("(=> a b c)", &vars).unwrap();
    // (a => (b => c)) is true here, ((a => b) => c) is false.
    let inputs = HashMap::from([
        ("a".to_string(), Value::Bool(false)),
        ("b".to_string(), Value::Bool(true)),
        ("c".to_string(), Value::Bool(false)),
    ]);
    for binding in bindings() {
        let (block, env) = lower(binding, &vars, &term);
        assert_eq!(run_block(&block, &env, &inputs, 0), Value::Bool(true));
    }
}

// ============================================================================
// Arithmetic and division
// ============================================================================

#[test]
fn test_euclidean_division_and_remainder() {
    for binding in bindings() {
        assert_eq!(eval_lowered(binding, "(div x y)", -7, 2), Value::Int(-4));
        assert_eq!(eval_lowered(binding, "(mod x y)", -7, 2), Value::Int(1));
        assert_eq!(eval_lowered(binding, "(div x y)", 7, -2), Value::Int(-3));
        assert_eq!(eval_lowered(binding, "(mod x y)", -7, -2), Value::Int(1));
    }
}

#[test]
fn test_division_by_zero_yields_sentinel() {
    for binding in bindings() {
        assert_eq!(eval_lowered(binding, "(div x y)", 5, 0), Value::Int(7));
        assert_eq!(eval_lowered(binding, "(mod (+ x 1) (- y y))", 5, 3), Value::Int(7));
    }
}

#[test]
fn test_nary_division_guards_every_divisor() {
    for binding in bindings() {
        assert_eq!(eval_lowered(binding, "(div x y 2)", 9, 0), Value::Int(7));
        assert_eq!(eval_lowered(binding, "(div x 2 y)", 9, 0), Value::Int(7));
        assert_eq!(eval_lowered(binding, "(div x 2 y)", 9, 2), Value::Int(2));
    }
}

#[test]
fn test_guarded_division_in_conjunction() {
    let text = "(and (> x 0) (= (div y x) 3))";
    for binding in bindings() {
        assert_eq!(eval_lowered(binding, text, 6, 18), Value::Bool(true));
        assert_eq!(eval_lowered(binding, text, 6, 19), Value::Bool(true));
        assert_eq!(eval_lowered(binding, text, 6, 24), Value::Bool(false));
        assert_eq!(eval_lowered(binding, text, 0, 18), Value::Bool(false));
    }
}

#[test]
fn test_shadowed_divisions_get_their_own_sentinels() {
    // With y = 0 both quotients are unconstrained, so they may differ.
    let vars = int_vars();
    let term = parse_term("(= (div x y) (let ((x (+ x 1))) (div x y)))", &vars).unwrap();
    for binding in bindings() {
        let (block, env) = lower(binding, &vars, &term);
        assert_eq!(env.sentinels().count(), 2);
        let mut frame = ints(4, 0);
        for (i, param) in env.sentinels().enumerate() {
            frame.insert(param.name.clone(), Value::Int(i as i128));
        }
        let mut interpreter = Interpreter::new(frame);
        interpreter.run(&block.statements);
        assert_eq!(interpreter.lookup(&block.identifier), Value::Bool(false));
    }
}

#[test]
fn test_abs_and_unary_minus() {
    for binding in bindings() {
        assert_eq!(eval_lowered(binding, "(abs (- x))", 4, 0), Value::Int(4));
        assert_eq!(eval_lowered(binding, "(abs (- x y))", 1, 6), Value::Int(5));
    }
}

#[test]
fn test_distinct_is_pairwise() {
    for binding in bindings() {
        assert_eq!(eval_lowered(binding, "(distinct x y 3)", 1, 2), Value::Bool(true));
        assert_eq!(eval_lowered(binding, "(distinct x y 3)", 3, 2), Value::Bool(false));
        assert_eq!(eval_lowered(binding, "(= x y 2)", 2, 2), Value::Bool(true));
    }
}

// ============================================================================
// Scoping
// ============================================================================

#[test]
fn test_let_shadowing_is_restored() {
    for binding in bindings() {
        assert_eq!(
            eval_lowered(
                binding,
                "(and (let ((x (+ x 1))) (let ((x (* x 2))) (= x 8))) (= x 3))",
                3,
                0
            ),
            Value::Bool(true)
        );
    }
}

#[test]
fn test_let_is_parallel() {
    for binding in bindings() {
        assert_eq!(
            eval_lowered(binding, "(let ((x y) (y x)) (- x y))", 10, 3),
            Value::Int(-7)
        );
    }
}

// ============================================================================
// Quantifiers
// ============================================================================

#[test]
fn test_bounded_exists() {
    for binding in bindings() {
        let text = "(exists ((z Int)) (= (* z z) x))";
        assert_eq!(eval_lowered(binding, text, 49, 0), Value::Bool(true));
        assert_eq!(eval_lowered(binding, text, 50, 0), Value::Bool(false));
    }
}

#[test]
fn test_bounded_forall_is_an_under_approximation() {
    for binding in bindings() {
        assert_eq!(
            eval_lowered(binding, "(forall ((z Int)) (< z 100))", 0, 0),
            Value::Bool(false)
        );
        assert_eq!(
            eval_lowered(binding, "(forall ((z Int)) (< z 101))", 0, 0),
            Value::Bool(true)
        );
    }
}

#[test]
fn test_nested_binders_shadow_free_variables() {
    for binding in bindings() {
        let text = "(forall ((x Int) (w Int)) (and (<= x 100) (>= w (- 100))))";
        assert_eq!(eval_lowered(binding, text, 1000, 0), Value::Bool(true));
        assert_eq!(
            eval_lowered(binding, "(exists ((y Int)) (= (+ y y) x))", 84, 0),
            Value::Bool(true)
        );
    }
}

// ============================================================================
// Dafny method mode
// ============================================================================

#[test]
fn test_dafny_helper_methods_return_through_postconditions() {
    let script = parse_script(
        "(declare-fun x () Int) (declare-fun y () Int) \
         (assert (> x y)) (assert (distinct x 0)) (check-sat)",
    )
    .unwrap();
    let options = LowerOptions {
        method_mode: true,
        ..LowerOptions::default()
    };
    let source = Transformer::new(Language::Dafny, options)
        .transform_script(&script)
        .unwrap()
        .source;
    for (i, ensures) in ["ensures ret == (x > y)", "ensures ret == (x != 0)"]
        .iter()
        .enumerate()
    {
        let head = format!("method {{:verify false}} formula{i}(x: int, y: int) returns (ret: bool)");
        assert!(source.contains(&head), "{source}");
        assert!(source.contains(ensures), "{source}");
        assert!(source.contains(&format!(":= formula{i}(x, y);")), "{source}");
    }
    assert!(source.contains("    ret := tmp"));
    assert!(source.contains("method check(x: int, y: int)"));
}

#[test]
fn test_postconditions_agree_with_method_bodies() {
    let vars = int_vars();
    let options = LowerOptions::default();
    let texts = [
        "(and (> x 0) (= (div y x) 3))",
        "(=> (< x y) (distinct (mod y 3) x) (>= (abs x) 2))",
        "(xor (= x y) (let ((x (- x 1))) (< (div x 2) y)))",
        "(or (not (= (ite (> x y) x y) 2)) (= (* x y) (- 4)))",
    ];
    for text in texts {
        let term = parse_term(text, &vars).unwrap();
        let ctx = BindingContext::new(&vars, &IndexMap::new(), &DafnyBinding, &options).unwrap();
        let mut env = LoweringEnv::new(options.max_fresh_ids);
        let block = Lowerer::new(&DafnyBinding, &options)
            .lower(&term, &ctx, &mut env)
            .unwrap();
        let (postcondition, _) = InlineLowerer::new(&DafnyBinding, &options)
            .lower(&term, &ctx, &mut env)
            .unwrap();
        for x in -3..=3 {
            for y in -3..=3 {
                let mut frame = ints(x, y);
                for param in env.sentinels() {
                    frame.insert(param.name.clone(), Value::Int(7));
                }
                let mut interpreter = Interpreter::new(frame);
                interpreter.run(&block.statements);
                assert_eq!(
                    interpreter.lookup(&block.identifier),
                    interpreter.eval(&postcondition),
                    "{text} at x={x}, y={y}"
                );
            }
        }
    }
}
