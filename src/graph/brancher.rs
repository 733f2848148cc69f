use std::fmt;

use crate::morphism::{Morphism, Value};

/// Structural match against a node's value.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Any,
    Value(Value),
    Tuple(Vec<Pattern>),
}

impl Pattern {
    /// Matches every value of the node's type.
    pub fn is_irrefutable(&self) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Value(Value::Unit) => true,
            Pattern::Value(_) => false,
            Pattern::Tuple(items) => items.iter().all(Pattern::is_irrefutable),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pattern::Any => write!(f, "_"),
            Pattern::Value(value) if value.is_negative() => write!(f, "({value})"),
            Pattern::Value(value) => write!(f, "{value}"),
            Pattern::Tuple(items) => write!(
                f,
                "({})",
                items
                    .iter()
                    .map(Pattern::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Decides when an output pin is taken.
#[derive(Debug, Clone)]
pub enum Brancher {
    Any,
    Pattern(Pattern),
    /// Taken when the morphism applied to the node's value yields `True`.
    Guard(Morphism),
}

impl Brancher {
    pub fn is_irrefutable(&self) -> bool {
        match self {
            Brancher::Any => true,
            Brancher::Pattern(pattern) => pattern.is_irrefutable(),
            Brancher::Guard(_) => false,
        }
    }
}

impl fmt::Display for Brancher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Brancher::Any => write!(f, "_"),
            Brancher::Pattern(pattern) => write!(f, "{pattern}"),
            Brancher::Guard(guard) => write!(f, "?{guard}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irrefutable() {
        assert!(Brancher::Any.is_irrefutable());
        assert!(Pattern::Tuple(vec![Pattern::Any, Pattern::Any]).is_irrefutable());
        assert!(!Pattern::Tuple(vec![Pattern::Any, Pattern::Value(Value::Int(0))]).is_irrefutable());
        assert!(!Brancher::Pattern(Pattern::Value(Value::Bool(true))).is_irrefutable());
    }

    #[test]
    fn test_display() {
        let pattern = Pattern::Tuple(vec![
            Pattern::Value(Value::Int(-1)),
            Pattern::Any,
            Pattern::Value(Value::Char('x')),
        ]);
        assert_eq!(pattern.to_string(), "((-1), _, 'x')");
    }
}
