//! Helpers shared by the lowering tests: an interpreter for the statement
//! IR that enforces block scoping, and a reference evaluator for terms.

#![allow(dead_code)]

use indexmap::IndexMap;
use std::collections::HashMap;
use veridiff_lower::{
    BinOp, BindingContext, CodeBlock, Expr, LanguageBinding, LowerOptions, Lowerer, LoweringEnv,
    NaryOp, Stmt, ValueType, QUANTIFIER_BOUND,
};
use veridiff_smt::{Quantifier, Sort, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i128),
    Real(f64),
}

impl Value {
    pub fn as_bool(self) -> bool {
        match self {
            Value::Bool(b) => b,
            other => panic!("expected a boolean, got {other:?}"),
        }
    }

    fn as_real(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Real(r) => r,
            Value::Bool(_) => panic!("expected a number"),
        }
    }

    fn default_of(ty: ValueType) -> Value {
        match ty {
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Real => Value::Real(0.0),
        }
    }
}

fn euclid_div(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b < 0 {
        if b > 0 {
            q - 1
        } else {
            q + 1
        }
    } else {
        q
    }
}

fn euclid_mod(a: i128, b: i128) -> i128 {
    a - b * euclid_div(a, b)
}

fn compare(op: BinOp, lhs: Value, rhs: Value) -> bool {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinOp::Eq => a == b,
            BinOp::Ne => a != b,
            BinOp::Implies => !a || b,
            _ => panic!("{op:?} on booleans"),
        },
        (Value::Int(a), Value::Int(b)) => match op {
            BinOp::Eq => a == b,
            BinOp::Ne => a != b,
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            _ => panic!("{op:?} is not a comparison"),
        },
        (a, b) => {
            let (a, b) = (a.as_real(), b.as_real());
            match op {
                BinOp::Eq => a == b,
                BinOp::Ne => a != b,
                BinOp::Lt => a < b,
                BinOp::Le => a <= b,
                BinOp::Gt => a > b,
                BinOp::Ge => a >= b,
                _ => panic!("{op:?} is not a comparison"),
            }
        }
    }
}

fn arith(op: NaryOp, a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Value::Int(match op {
            NaryOp::Add => a + b,
            NaryOp::Sub => a - b,
            NaryOp::Mul => a * b,
            _ => unreachable!(),
        }),
        (a, b) => {
            let (a, b) = (a.as_real(), b.as_real());
            Value::Real(match op {
                NaryOp::Add => a + b,
                NaryOp::Sub => a - b,
                NaryOp::Mul => a * b,
                _ => unreachable!(),
            })
        }
    }
}

/// Runs lowered statements. Reading an undeclared identifier, declaring
/// one twice in a block, or dividing by zero panics.
pub struct Interpreter {
    frames: Vec<HashMap<String, Value>>,
    pub assertion_failed: bool,
}

impl Interpreter {
    pub fn new(inputs: HashMap<String, Value>) -> Self {
        Self {
            frames: vec![inputs, HashMap::new()],
            assertion_failed: false,
        }
    }

    pub fn lookup(&self, name: &str) -> Value {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.get(name).copied())
            .unwrap_or_else(|| panic!("`{name}` read out of scope"))
    }

    fn set(&mut self, name: &str, value: Value) {
        let frame = self
            .frames
            .iter_mut()
            .rev()
            .find(|f| f.contains_key(name))
            .unwrap_or_else(|| panic!("`{name}` assigned out of scope"));
        frame.insert(name.to_string(), value);
    }

    fn declare(&mut self, name: &str, value: Value) {
        let frame = self.frames.last_mut().unwrap();
        assert!(
            frame.insert(name.to_string(), value).is_none(),
            "`{name}` declared twice in one block"
        );
    }

    pub fn run(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.exec(stmt);
        }
    }

    fn block(&mut self, stmts: &[Stmt]) {
        self.frames.push(HashMap::new());
        self.run(stmts);
        self.frames.pop();
    }

    fn exec(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Declare { name, ty, init } => {
                let value = init
                    .as_ref()
                    .map_or(Value::default_of(*ty), |e| self.eval(e));
                self.declare(name, value);
            }
            Stmt::Assign { name, value } => {
                let value = self.eval(value);
                self.set(name, value);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond).as_bool() {
                    self.block(then_branch);
                } else {
                    self.block(else_branch);
                }
            }
            Stmt::BoundedLoop {
                counter,
                lo,
                hi,
                guard,
                body,
            } => {
                self.frames.push(HashMap::new());
                self.declare(counter, Value::Int(i128::from(*lo)));
                loop {
                    let Value::Int(i) = self.lookup(counter) else {
                        unreachable!()
                    };
                    if i > i128::from(*hi) || !self.eval(guard).as_bool() {
                        break;
                    }
                    self.block(body);
                    self.set(counter, Value::Int(i + 1));
                }
                self.frames.pop();
            }
            Stmt::Call { .. } => panic!("calls are not interpreted"),
            Stmt::Assert(cond) => {
                if !self.eval(cond).as_bool() {
                    self.assertion_failed = true;
                }
            }
        }
    }

    pub fn eval(&self, expr: &Expr) -> Value {
        match expr {
            Expr::Ident(name) => self.lookup(name),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(text) => Value::Int(text.parse().unwrap()),
            Expr::Real(text) => Value::Real(text.parse().unwrap()),
            Expr::Not(inner) => Value::Bool(!self.eval(inner).as_bool()),
            Expr::Neg(inner) => match self.eval(inner) {
                Value::Int(i) => Value::Int(-i),
                Value::Real(r) => Value::Real(-r),
                Value::Bool(_) => panic!("negated boolean"),
            },
            Expr::Binary(op, lhs, rhs) => {
                let (a, b) = (self.eval(lhs), self.eval(rhs));
                match op {
                    BinOp::IntDiv | BinOp::IntMod => {
                        let (Value::Int(a), Value::Int(b)) = (a, b) else {
                            panic!("integer division on {a:?} and {b:?}")
                        };
                        assert!(b != 0, "integer division by zero reached");
                        Value::Int(if *op == BinOp::IntDiv {
                            euclid_div(a, b)
                        } else {
                            euclid_mod(a, b)
                        })
                    }
                    BinOp::RealDiv => {
                        let b = b.as_real();
                        assert!(b != 0.0, "real division by zero reached");
                        Value::Real(a.as_real() / b)
                    }
                    _ => Value::Bool(compare(*op, a, b)),
                }
            }
            Expr::Nary(op, operands) => {
                let values: Vec<Value> = operands.iter().map(|e| self.eval(e)).collect();
                match op {
                    NaryOp::And => Value::Bool(values.iter().all(|v| v.as_bool())),
                    NaryOp::Or => Value::Bool(values.iter().any(|v| v.as_bool())),
                    NaryOp::Xor => Value::Bool(values.iter().fold(false, |acc, v| acc ^ v.as_bool())),
                    _ => values
                        .into_iter()
                        .reduce(|acc, v| arith(*op, acc, v))
                        .unwrap(),
                }
            }
            // Only the taken branch is evaluated.
            Expr::Ite(cond, then, otherwise) => {
                if self.eval(cond).as_bool() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::ToReal(inner) => Value::Real(self.eval(inner).as_real()),
            Expr::AnyFalse(operands) => {
                Value::Bool(operands.iter().any(|e| !self.eval(e).as_bool()))
            }
        }
    }
}

/// Reference value of `term`; `None` when a division by zero is reached
pub fn eval_term(term: &Term, env: &HashMap<String, Value>) -> Option<Value> {
    match term {
        Term::Var { name, .. } => Some(env[name]),
        Term::Const { literal, sort } => Some(match sort {
            Sort::Bool => Value::Bool(literal == "true"),
            Sort::Int => Value::Int(literal.parse().unwrap()),
            _ => Value::Real(literal.parse().unwrap()),
        }),
        Term::Labeled { inner, .. } => eval_term(inner, env),
        Term::Let { bindings, body } => {
            let mut inner = env.clone();
            for (name, bound) in bindings {
                inner.insert(name.clone(), eval_term(bound, env)?);
            }
            eval_term(body, &inner)
        }
        Term::Quant {
            kind,
            bindings,
            body,
        } => {
            let forall = *kind == Quantifier::Forall;
            let names: Vec<&str> = bindings.iter().map(|(n, _)| n.as_str()).collect();
            quantify(forall, &names, body, &mut env.clone())
        }
        Term::App { op, args, .. } => {
            let values = args
                .iter()
                .map(|a| eval_term(a, env))
                .collect::<Option<Vec<Value>>>()?;
            apply(op, &values)
        }
    }
}

fn quantify(
    forall: bool,
    names: &[&str],
    body: &Term,
    env: &mut HashMap<String, Value>,
) -> Option<Value> {
    let Some((first, rest)) = names.split_first() else {
        return eval_term(body, env);
    };
    for i in -QUANTIFIER_BOUND..=QUANTIFIER_BOUND {
        env.insert((*first).to_string(), Value::Int(i128::from(i)));
        let holds = quantify(forall, rest, body, env)?.as_bool();
        if holds != forall {
            return Some(Value::Bool(!forall));
        }
    }
    Some(Value::Bool(forall))
}

fn apply(op: &str, values: &[Value]) -> Option<Value> {
    let bools = || values.iter().map(|v| v.as_bool());
    Some(match op {
        "not" => Value::Bool(!values[0].as_bool()),
        "and" => Value::Bool(bools().all(|b| b)),
        "or" => Value::Bool(bools().any(|b| b)),
        "xor" => Value::Bool(bools().fold(false, |a, b| a ^ b)),
        "=>" => {
            let (last, premises) = values.split_last()?;
            Value::Bool(premises.iter().any(|p| !p.as_bool()) || last.as_bool())
        }
        "ite" => {
            if values[0].as_bool() {
                values[1]
            } else {
                values[2]
            }
        }
        "=" | "distinct" | "<" | "<=" | ">" | ">=" => {
            let cmp = BinOp::comparison(op)?;
            let mut all = true;
            for (i, a) in values.iter().enumerate() {
                for b in &values[i + 1..] {
                    all &= compare(cmp, *a, *b);
                }
            }
            Value::Bool(all)
        }
        "-" if values.len() == 1 => match values[0] {
            Value::Int(i) => Value::Int(-i),
            v => Value::Real(-v.as_real()),
        },
        "+" | "-" | "*" => {
            let nary = match op {
                "+" => NaryOp::Add,
                "-" => NaryOp::Sub,
                _ => NaryOp::Mul,
            };
            values.iter().copied().reduce(|a, b| arith(nary, a, b))?
        }
        "abs" => match values[0] {
            Value::Int(i) => Value::Int(i.abs()),
            v => Value::Real(v.as_real().abs()),
        },
        "div" | "mod" => {
            let mut acc = match values[0] {
                Value::Int(i) => i,
                _ => return None,
            };
            for v in &values[1..] {
                let Value::Int(d) = v else { return None };
                if *d == 0 {
                    return None;
                }
                acc = if op == "div" {
                    euclid_div(acc, *d)
                } else {
                    euclid_mod(acc, *d)
                };
            }
            Value::Int(acc)
        }
        "/" => {
            let mut acc = values[0].as_real();
            for v in &values[1..] {
                let d = v.as_real();
                if d == 0.0 {
                    return None;
                }
                acc /= d;
            }
            Value::Real(acc)
        }
        "to_real" => Value::Real(values[0].as_real()),
        other => panic!("no reference semantics for `{other}`"),
    })
}

/// Lower `term` over `vars` with `binding`
pub fn lower(
    binding: &dyn LanguageBinding,
    vars: &IndexMap<String, Sort>,
    term: &Term,
) -> (CodeBlock, LoweringEnv) {
    let options = LowerOptions::default();
    let ctx = BindingContext::new(vars, &IndexMap::new(), binding, &options).unwrap();
    let mut env = LoweringEnv::new(options.max_fresh_ids);
    let block = Lowerer::new(binding, &options)
        .lower(term, &ctx, &mut env)
        .unwrap();
    (block, env)
}

/// Run a lowered block with `inputs`; every sentinel reads as `sentinel`
pub fn run_block(
    block: &CodeBlock,
    env: &LoweringEnv,
    inputs: &HashMap<String, Value>,
    sentinel: i128,
) -> Value {
    let mut frame = inputs.clone();
    for param in env.sentinels() {
        let value = match param.ty {
            ValueType::Real => Value::Real(sentinel as f64),
            _ => Value::Int(sentinel),
        };
        frame.insert(param.name.clone(), value);
    }
    let mut interpreter = Interpreter::new(frame);
    interpreter.run(&block.statements);
    interpreter.lookup(&block.identifier)
}
