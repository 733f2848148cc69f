use std::cmp::Ordering;

use tracing::debug;

use crate::backend::{BranchLabel, Expr, FunctionPlan, ProgramPlan, Step};
use crate::backend::plan::Body;

use super::EvalError;
use super::scope::Scope;
use super::value::RValue;

pub const DEFAULT_MAX_DEPTH: usize = 2_000;

/// Evaluates plans directly, block by block, the way the rendered programs
/// would run.
pub struct Interpreter<'p> {
    plan: &'p ProgramPlan,
    depth: usize,
    max_depth: usize,
}

impl<'p> Interpreter<'p> {
    pub fn new(plan: &'p ProgramPlan) -> Self {
        Self {
            plan,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn run_main(&mut self) -> Result<RValue, EvalError> {
        let plan = self.plan;
        let main = plan.main().ok_or(EvalError::NoMain)?;
        self.run_function(main, RValue::Unit)
    }

    pub fn call(&mut self, name: &str, arg: RValue) -> Result<RValue, EvalError> {
        let plan = self.plan;
        let function = plan
            .function(name)
            .filter(|function| !function.is_main())
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        self.run_function(function, arg)
    }

    fn run_function(&mut self, function: &'p FunctionPlan, arg: RValue) -> Result<RValue, EvalError> {
        if self.depth >= self.max_depth {
            return Err(EvalError::RecursionLimit {
                limit: self.max_depth,
            });
        }
        debug!(function = function.name.as_str(), arg = %arg, depth = self.depth, "calling");

        let mut scope = Scope::new();
        if let Some(param) = &function.param {
            scope.add(param.clone(), arg);
        }
        self.depth += 1;
        let result = self.run_block(&function.body, &mut scope, &function.name);
        self.depth -= 1;
        result
    }

    fn run_block(
        &mut self,
        body: &'p Body,
        scope: &mut Scope,
        function: &str,
    ) -> Result<RValue, EvalError> {
        scope.enter();
        for step in &body.definitions {
            match step {
                Step::Bind { var, expr, .. } => {
                    let value = self.eval(expr, scope)?;
                    scope.add(var.clone(), value);
                }
                Step::Unpack { tuple, vars, .. } => {
                    let value = lookup(scope, tuple)?;
                    match value {
                        RValue::Tuple(items) if items.len() == vars.len() => {
                            for (var, item) in vars.iter().zip(items) {
                                scope.add(var.clone(), item);
                            }
                        }
                        other => {
                            return Err(EvalError::TypeMismatch {
                                op: "unpack".to_string(),
                                found: other.type_name().to_string(),
                            });
                        }
                    }
                }
                Step::Return(expr) => {
                    let value = self.eval(expr, scope)?;
                    scope.leave();
                    return Ok(value);
                }
            }
        }

        for (label, child) in &body.branches {
            if self.select(label, scope)? {
                let value = self.run_block(child, scope, function);
                scope.leave();
                return value;
            }
        }
        scope.leave();
        Err(EvalError::NoBranch {
            function: function.to_string(),
        })
    }

    fn select(&mut self, label: &BranchLabel, scope: &mut Scope) -> Result<bool, EvalError> {
        match label {
            BranchLabel::Otherwise => Ok(true),
            BranchLabel::Pattern {
                subject, pattern, ..
            } => Ok(lookup(scope, subject)?.matches(pattern)),
            BranchLabel::Guard(guard) => match self.eval(guard, scope)? {
                RValue::Bool(taken) => Ok(taken),
                other => Err(EvalError::TypeMismatch {
                    op: "guard".to_string(),
                    found: other.type_name().to_string(),
                }),
            },
        }
    }

    fn eval(&mut self, expr: &Expr, scope: &mut Scope) -> Result<RValue, EvalError> {
        match expr {
            Expr::Var(name) => lookup(scope, name),
            Expr::Lit(value) => Ok(value.clone().into()),
            Expr::Tuple(items) => items
                .iter()
                .map(|item| self.eval(item, scope))
                .collect::<Result<Vec<_>, _>>()
                .map(RValue::Tuple),
            Expr::Lambda { param, body } => Ok(RValue::Closure {
                param: param.clone(),
                body: (**body).clone(),
                env: scope.capture(),
            }),
            Expr::Call { func, arity, args } => {
                let mut complete = args.len() >= *arity;
                let mut values = Vec::with_capacity(args.len().max(*arity));
                for arg in args {
                    match arg {
                        Some(arg) => values.push(Some(self.eval(arg, scope)?)),
                        None => {
                            complete = false;
                            values.push(None);
                        }
                    }
                }
                if complete {
                    return self.invoke(func, values.into_iter().flatten().collect());
                }
                values.resize(*arity, None);
                Ok(RValue::Partial {
                    func: func.clone(),
                    args: values,
                })
            }
        }
    }

    /// Saturated call of a program function or builtin. Arguments beyond
    /// the callee's arity are applied to its result.
    fn invoke(&mut self, func: &str, args: Vec<RValue>) -> Result<RValue, EvalError> {
        let mut args = args.into_iter();
        let plan = self.plan;
        let mut result = match plan.function(func).filter(|function| !function.is_main()) {
            Some(function) => {
                let arg = args.next().unwrap_or(RValue::Unit);
                self.run_function(function, arg)?
            }
            None => {
                let arity = builtin_arity(func)
                    .ok_or_else(|| EvalError::UnknownFunction(func.to_string()))?;
                let taken: Vec<RValue> = args.by_ref().take(arity).collect();
                if taken.len() < arity {
                    let mut partial: Vec<Option<RValue>> = taken.into_iter().map(Some).collect();
                    partial.resize(arity, None);
                    return Ok(RValue::Partial {
                        func: func.to_string(),
                        args: partial,
                    });
                }
                builtin(func, taken)?
            }
        };
        for arg in args {
            result = self.apply(result, arg)?;
        }
        Ok(result)
    }

    fn apply(&mut self, function: RValue, arg: RValue) -> Result<RValue, EvalError> {
        match function {
            RValue::Partial { func, mut args } => {
                let Some(hole) = args.iter_mut().find(|slot| slot.is_none()) else {
                    return Err(EvalError::NotAFunction {
                        found: format!("saturated {func}"),
                    });
                };
                *hole = Some(arg);
                if args.iter().any(Option::is_none) {
                    return Ok(RValue::Partial { func, args });
                }
                self.invoke(&func, args.into_iter().flatten().collect())
            }
            RValue::Closure { param, body, env } => {
                let mut scope = Scope::with_env(&env);
                scope.add(param, arg);
                self.eval(&body, &mut scope)
            }
            other => Err(EvalError::NotAFunction {
                found: other.type_name().to_string(),
            }),
        }
    }
}

fn lookup(scope: &Scope, name: &str) -> Result<RValue, EvalError> {
    scope
        .resolve(name)
        .cloned()
        .ok_or_else(|| EvalError::UnboundVariable(name.to_string()))
}

fn builtin_arity(name: &str) -> Option<usize> {
    match name {
        "+" | "-" | "*" | "/" | "div" | "mod" | "<" | "<=" | ">" | ">=" | "==" | "/=" | "&&"
        | "||" => Some(2),
        "not" | "negate" | "fst" | "snd" | "id" => Some(1),
        _ => None,
    }
}

fn builtin(name: &str, args: Vec<RValue>) -> Result<RValue, EvalError> {
    let mismatch = |found: &RValue| EvalError::TypeMismatch {
        op: name.to_string(),
        found: found.type_name().to_string(),
    };
    match (name, args.as_slice()) {
        ("+" | "-" | "*" | "/" | "div" | "mod", [a, b]) => arithmetic(name, a, b),
        ("==", [a, b]) => Ok(RValue::Bool(a == b)),
        ("/=", [a, b]) => Ok(RValue::Bool(a != b)),
        ("<" | "<=" | ">" | ">=", [a, b]) => {
            let ordering = compare(a, b).ok_or_else(|| mismatch(b))?;
            Ok(RValue::Bool(match name {
                "<" => ordering == Ordering::Less,
                "<=" => ordering != Ordering::Greater,
                ">" => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        ("&&", [RValue::Bool(a), RValue::Bool(b)]) => Ok(RValue::Bool(*a && *b)),
        ("||", [RValue::Bool(a), RValue::Bool(b)]) => Ok(RValue::Bool(*a || *b)),
        ("not", [RValue::Bool(a)]) => Ok(RValue::Bool(!a)),
        ("negate", [RValue::Int(i)]) => i
            .checked_neg()
            .map(RValue::Int)
            .ok_or(EvalError::Overflow {
                op: name.to_string(),
            }),
        ("negate", [RValue::Float(x)]) => Ok(RValue::Float(-x)),
        ("fst", [RValue::Tuple(items)]) if items.len() == 2 => Ok(items[0].clone()),
        ("snd", [RValue::Tuple(items)]) if items.len() == 2 => Ok(items[1].clone()),
        ("id", [a]) => Ok(a.clone()),
        (_, [.., last]) => Err(mismatch(last)),
        (_, []) => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn arithmetic(op: &str, a: &RValue, b: &RValue) -> Result<RValue, EvalError> {
    let overflow = || EvalError::Overflow { op: op.to_string() };
    match (a, b) {
        (RValue::Int(x), RValue::Int(y)) => {
            let (x, y) = (*x, *y);
            if matches!(op, "/" | "div" | "mod") && y == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let result = match op {
                "+" => x.checked_add(y),
                "-" => x.checked_sub(y),
                "*" => x.checked_mul(y),
                "/" => x.checked_div(y),
                "div" => floor_div(x, y),
                _ => floor_div(x, y)
                    .and_then(|q| q.checked_mul(y))
                    .and_then(|m| x.checked_sub(m)),
            };
            result.map(RValue::Int).ok_or_else(overflow)
        }
        (RValue::Float(x), RValue::Float(y)) => match op {
            "+" => Ok(RValue::Float(x + y)),
            "-" => Ok(RValue::Float(x - y)),
            "*" => Ok(RValue::Float(x * y)),
            "/" => Ok(RValue::Float(x / y)),
            _ => Err(EvalError::TypeMismatch {
                op: op.to_string(),
                found: "Float".to_string(),
            }),
        },
        (RValue::Int(_), other) | (other, _) => Err(EvalError::TypeMismatch {
            op: op.to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

/// Division rounding toward negative infinity.
fn floor_div(x: i64, y: i64) -> Option<i64> {
    let q = x.checked_div(y)?;
    if x % y != 0 && ((x < 0) != (y < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

fn compare(a: &RValue, b: &RValue) -> Option<Ordering> {
    match (a, b) {
        (RValue::Int(x), RValue::Int(y)) => Some(x.cmp(y)),
        (RValue::Float(x), RValue::Float(y)) => x.partial_cmp(y),
        (RValue::Char(x), RValue::Char(y)) => Some(x.cmp(y)),
        (RValue::Bool(x), RValue::Bool(y)) => Some(x.cmp(y)),
        (RValue::Str(x), RValue::Str(y)) => Some(x.cmp(y)),
        (RValue::Unit, RValue::Unit) => Some(Ordering::Equal),
        (RValue::Tuple(xs), RValue::Tuple(ys)) if xs.len() == ys.len() => {
            for (x, y) in xs.iter().zip(ys) {
                match compare(x, y)? {
                    Ordering::Equal => continue,
                    ordering => return Some(ordering),
                }
            }
            Some(Ordering::Equal)
        }
        _ => None,
    }
}
