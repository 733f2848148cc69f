//! Reference evaluator: runs a [`ProgramPlan`] in process, so a program
//! can be checked without a host toolchain.

mod eval;
mod scope;
mod value;

pub use eval::{DEFAULT_MAX_DEPTH, Interpreter};
pub use scope::Scope;
pub use value::{CapturedEnv, RValue};

use thiserror::Error;

use crate::backend::ProgramPlan;
use crate::cook::parse_pattern;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("program has no main function")]
    NoMain,
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),
    #[error("`{op}` cannot take a {found}")]
    TypeMismatch { op: String, found: String },
    #[error("cannot apply a {found}")]
    NotAFunction { found: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("`{op}` overflowed")]
    Overflow { op: String },
    #[error("no branch of `{function}` matched")]
    NoBranch { function: String },
    #[error("recursion deeper than {limit} calls")]
    RecursionLimit { limit: usize },
    #[error("bad argument `{text}`: {reason}")]
    BadArgument { text: String, reason: String },
}

/// Run the plan's `main`.
pub fn run_main(plan: &ProgramPlan) -> Result<RValue, EvalError> {
    Interpreter::new(plan).run_main()
}

/// Call the program function `name` with `arg`.
pub fn call(plan: &ProgramPlan, name: &str, arg: RValue) -> Result<RValue, EvalError> {
    Interpreter::new(plan).call(name, arg)
}

/// Read an argument written like a literal or a tuple of literals.
pub fn parse_value(text: &str) -> Result<RValue, EvalError> {
    let pattern = parse_pattern(text).map_err(|err| EvalError::BadArgument {
        text: text.to_string(),
        reason: err.to_string(),
    })?;
    RValue::from_pattern(&pattern).ok_or_else(|| EvalError::BadArgument {
        text: text.to_string(),
        reason: "`_` is not a value".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("6"), Ok(RValue::Int(6)));
        assert_eq!(
            parse_value("(1, 'x')"),
            Ok(RValue::Tuple(vec![RValue::Int(1), RValue::Char('x')]))
        );
        assert!(matches!(parse_value("_"), Err(EvalError::BadArgument { .. })));
        assert!(matches!(parse_value("fib"), Err(EvalError::BadArgument { .. })));
    }
}
