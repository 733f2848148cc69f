//! # Morphism Algebra
//!
//! Morphisms are the typed transformation expressions carried by arrows and
//! guards. They are immutable and shared (`Rc`), so a bound argument or a
//! tuple component can appear in several larger morphisms without copying.
//!
//! Every morphism has a parameter list and a result type:
//!
//! ```text
//! (+)          params [a, a]   result a
//! (+ 1)        params [Int]    result Int
//! 42           params []       result Int     -- zero-argument value
//! !(+ 1, 7)    params [Int]    result (Int, Int)
//! $1           params [a]      result a       -- slot 1 of an intersection
//! ```
//!
//! Applied to an arrow, the first parameter is the arrow's input; a
//! zero-argument morphism ignores its input.

mod bind;
mod render;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::types::{MatchError, Type, match_types};

/// Literal constants embeddable in morphisms and patterns.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Char(char),
    Bool(bool),
    Str(String),
    Unit,
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Int(_) => Type::INT,
            Value::Float(_) => Type::FLOAT,
            Value::Char(_) => Type::CHAR,
            Value::Bool(_) => Type::BOOL,
            Value::Str(_) => Type::string(),
            Value::Unit => Type::SINGLETON,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Value::Int(i) => *i < 0,
            Value::Float(f) => *f < 0.0,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Char(c) => write!(f, "{c:?}"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Unit => write!(f, "()"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MorphismError {
    #[error("binding of `{morphism}` supplies no parameter it accepts")]
    EmptyBinding { morphism: String },
    #[error("argument {index} of `{morphism}`: {source}")]
    ArgumentMismatch {
        morphism: String,
        index: usize,
        source: MatchError,
    },
    #[error("tuple component `{component}` does not accept the common input: {source}")]
    TupleSource {
        component: String,
        source: MatchError,
    },
}

#[derive(Debug)]
pub enum MorphismKind {
    /// Named external function or value.
    Common { name: String },
    /// `$n` routes the input into slot `n` of an intersection; `$` is identity.
    Position(Option<usize>),
    Literal(Value),
    /// Applies every component to the same input.
    Tuple(Vec<Morphism>),
    /// Partial application. `inner` is never itself `Binded`.
    Binded {
        inner: Morphism,
        bindings: BTreeMap<usize, Morphism>,
    },
}

#[derive(Debug)]
struct Inner {
    kind: MorphismKind,
    params: Vec<Type>,
    result: Type,
}

#[derive(Debug, Clone)]
pub struct Morphism(Rc<Inner>);

impl Morphism {
    fn from_parts(kind: MorphismKind, params: Vec<Type>, result: Type) -> Self {
        Morphism(Rc::new(Inner {
            kind,
            params,
            result,
        }))
    }

    /// A named function; its parameters are read off the curried type.
    pub fn function(name: impl Into<String>, ty: &Type) -> Self {
        let (params, result) = ty.uncurry();
        Self::from_parts(MorphismKind::Common { name: name.into() }, params, result)
    }

    /// A named zero-argument value, even if its type is a function.
    pub fn value(name: impl Into<String>, ty: Type) -> Self {
        Self::from_parts(MorphismKind::Common { name: name.into() }, Vec::new(), ty)
    }

    pub fn position(slot: Option<usize>) -> Self {
        Self::from_parts(
            MorphismKind::Position(slot),
            vec![Type::var("a")],
            Type::var("a"),
        )
    }

    pub fn literal(value: Value) -> Self {
        let ty = value.ty();
        Self::from_parts(MorphismKind::Literal(value), Vec::new(), ty)
    }

    /// Tuple construction. Zero-argument when every component is; otherwise
    /// a one-parameter morphism whose input is shared by the functional
    /// components (the first fully concrete source wins).
    pub fn tuple(parts: Vec<Morphism>) -> Result<Self, MorphismError> {
        let sources: Vec<Type> = parts
            .iter()
            .filter(|part| part.param_count() > 0)
            .map(Morphism::source)
            .collect();
        let Some(first) = sources.first() else {
            let result = Type::tuple(parts.iter().map(|part| part.result().clone()).collect());
            return Ok(Self::from_parts(MorphismKind::Tuple(parts), Vec::new(), result));
        };
        let source = sources
            .iter()
            .find(|ty| ty.is_ground())
            .unwrap_or(first)
            .clone();

        let mut components = Vec::with_capacity(parts.len());
        for part in &parts {
            if part.param_count() == 0 {
                components.push(part.result().clone());
                continue;
            }
            let mapping =
                match_types(&part.source(), &source).map_err(|err| MorphismError::TupleSource {
                    component: part.to_string(),
                    source: err,
                })?;
            components.push(mapping.apply(&part.target()));
        }
        Ok(Self::from_parts(
            MorphismKind::Tuple(parts),
            vec![source],
            Type::tuple(components),
        ))
    }

    pub fn kind(&self) -> &MorphismKind {
        &self.0.kind
    }

    pub fn params(&self) -> &[Type] {
        &self.0.params
    }

    pub fn result(&self) -> &Type {
        &self.0.result
    }

    pub fn param_count(&self) -> usize {
        self.0.params.len()
    }

    /// Type of the arrow input; a zero-argument value is its own source.
    pub fn source(&self) -> Type {
        self.params()
            .first()
            .cloned()
            .unwrap_or_else(|| self.result().clone())
    }

    /// Type produced once the input has been supplied.
    pub fn target(&self) -> Type {
        match self.params() {
            [] => self.result().clone(),
            [_, rest @ ..] => Type::curried(rest, self.result().clone()),
        }
    }

    /// The type of this morphism used as an argument: its value type when it
    /// takes no parameters, its full function type otherwise.
    pub fn purified(&self) -> Type {
        Type::curried(self.params(), self.result().clone())
    }

    pub fn name(&self) -> Option<&str> {
        match self.kind() {
            MorphismKind::Common { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.name().is_some_and(is_operator)
    }

    /// `Some(slot)` for positional morphisms (`$` has slot `None`).
    pub fn slot(&self) -> Option<Option<usize>> {
        match self.kind() {
            MorphismKind::Position(slot) => Some(*slot),
            _ => None,
        }
    }

    /// Positional in the intersection sense: `$n` with an explicit slot.
    pub fn is_positional(&self) -> bool {
        matches!(self.kind(), MorphismKind::Position(Some(_)))
    }
}

/// A name made only of symbol characters renders infix.
pub fn is_operator(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| !c.is_alphanumeric() && c != '_' && c != '\'' && !c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus() -> Morphism {
        Morphism::function(
            "+",
            &Type::curried(&[Type::var("a"), Type::var("a")], Type::var("a")),
        )
    }

    #[test]
    fn test_common_signature() {
        let m = plus();
        assert_eq!(m.param_count(), 2);
        assert_eq!(m.source(), Type::var("a"));
        assert_eq!(m.target(), Type::func(Type::var("a"), Type::var("a")));
        assert!(m.is_operator());
    }

    #[test]
    fn test_literal_is_zero_argument() {
        let m = Morphism::literal(Value::Int(9));
        assert_eq!(m.param_count(), 0);
        assert_eq!(m.source(), Type::INT);
        assert_eq!(m.target(), Type::INT);
        assert_eq!(m.purified(), Type::INT);
    }

    #[test]
    fn test_position() {
        assert!(Morphism::position(Some(1)).is_positional());
        assert!(!Morphism::position(None).is_positional());
        assert_eq!(Morphism::position(Some(1)).slot(), Some(Some(1)));
    }

    #[test]
    fn test_tuple_of_values() {
        let m = Morphism::tuple(vec![
            Morphism::literal(Value::Int(9)),
            Morphism::literal(Value::Char('x')),
        ])
        .unwrap();
        assert_eq!(m.param_count(), 0);
        assert_eq!(m.result(), &Type::tuple(vec![Type::INT, Type::CHAR]));
    }

    #[test]
    fn test_tuple_with_shared_source() {
        let succ = Morphism::function("succ", &Type::func(Type::INT, Type::INT));
        let m = Morphism::tuple(vec![
            Morphism::position(None),
            succ,
            Morphism::literal(Value::Bool(true)),
        ])
        .unwrap();
        assert_eq!(m.params(), &[Type::INT]);
        assert_eq!(
            m.result(),
            &Type::tuple(vec![Type::INT, Type::INT, Type::BOOL])
        );
    }

    #[test]
    fn test_tuple_source_mismatch() {
        let succ = Morphism::function("succ", &Type::func(Type::INT, Type::INT));
        let not = Morphism::function("not", &Type::func(Type::BOOL, Type::BOOL));
        assert!(matches!(
            Morphism::tuple(vec![succ, not]),
            Err(MorphismError::TupleSource { .. })
        ));
    }

    #[test]
    fn test_operator_names() {
        assert!(is_operator("+"));
        assert!(is_operator("<="));
        assert!(!is_operator("div"));
        assert!(!is_operator(""));
    }
}
