use std::collections::HashMap;
use std::fmt;

use crate::backend::Expr;
use crate::graph::Pattern;
use crate::morphism::Value;

/// A captured environment for closures
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CapturedEnv(pub HashMap<String, RValue>);

/// Runtime value representation
#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    Unit,
    Int(i64),
    Float(f64),
    Char(char),
    Bool(bool),
    Str(String),
    Tuple(Vec<RValue>),
    /// Named function still waiting for the arguments marked `None`.
    Partial {
        func: String,
        args: Vec<Option<RValue>>,
    },
    Closure {
        param: String,
        body: Expr,
        env: CapturedEnv,
    },
}

impl RValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RValue::Unit => "()",
            RValue::Int(_) => "Int",
            RValue::Float(_) => "Float",
            RValue::Char(_) => "Char",
            RValue::Bool(_) => "Bool",
            RValue::Str(_) => "String",
            RValue::Tuple(_) => "tuple",
            RValue::Partial { .. } | RValue::Closure { .. } => "function",
        }
    }

    /// Whether `pattern` matches this value.
    pub fn matches(&self, pattern: &Pattern) -> bool {
        match (pattern, self) {
            (Pattern::Any, _) => true,
            (Pattern::Value(value), _) => RValue::from(value.clone()) == *self,
            (Pattern::Tuple(items), RValue::Tuple(values)) => {
                items.len() == values.len()
                    && items.iter().zip(values).all(|(item, value)| value.matches(item))
            }
            (Pattern::Tuple(_), _) => false,
        }
    }

    /// A value from literal or tuple-of-literal text, as written in patterns.
    pub fn from_pattern(pattern: &Pattern) -> Option<RValue> {
        match pattern {
            Pattern::Any => None,
            Pattern::Value(value) => Some(value.clone().into()),
            Pattern::Tuple(items) => items
                .iter()
                .map(RValue::from_pattern)
                .collect::<Option<Vec<_>>>()
                .map(RValue::Tuple),
        }
    }
}

impl From<Value> for RValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Int(i) => RValue::Int(i),
            Value::Float(x) => RValue::Float(x),
            Value::Char(c) => RValue::Char(c),
            Value::Bool(b) => RValue::Bool(b),
            Value::Str(s) => RValue::Str(s),
            Value::Unit => RValue::Unit,
        }
    }
}

/// Shown the way the rendered programs print their result.
impl fmt::Display for RValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RValue::Unit => write!(f, "()"),
            RValue::Int(i) => write!(f, "{i}"),
            RValue::Float(x) => write!(f, "{x:?}"),
            RValue::Char(c) => write!(f, "{c:?}"),
            RValue::Bool(true) => write!(f, "True"),
            RValue::Bool(false) => write!(f, "False"),
            RValue::Str(s) => write!(f, "{s:?}"),
            RValue::Tuple(items) => {
                write!(f, "(")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            RValue::Partial { func, .. } => write!(f, "<function {func}>"),
            RValue::Closure { .. } => write!(f, "<function>"),
        }
    }
}
