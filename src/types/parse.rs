//! Type signature text.
//!
//! ```text
//! signature := (application "=>")? function
//! function  := application ("->" function)?
//! application := atom atom*
//! atom      := ident | "(" ")" | "(" function ("," function)* ")" | "[" function "]"
//! ```
//!
//! Parsing yields a [`TypeExpr`] whose names are still text; callers decide
//! what a name means ([`TypeExpr::resolve`] with a lookup, or
//! [`TypeExpr::structural`] for signatures reported by an external tool).

use crate::lexer::Token;
use crate::parser::{
    ParseError, ParseState, Parser, Rule, arrow, comma, fat_arrow, ident, lbracket, lparen, many,
    optional, rbracket, rparen, sep_by1,
};

use super::ty::Type;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A named constructor applied to zero or more arguments.
    Con { name: String, args: Vec<TypeExpr> },
    Unit,
    Tuple(Vec<TypeExpr>),
    List(Box<TypeExpr>),
    Func(Box<TypeExpr>, Box<TypeExpr>),
}

impl TypeExpr {
    /// Resolve every constructor through `con`, which receives the name and
    /// the already-resolved arguments.
    pub fn resolve<E>(
        &self,
        con: &mut impl FnMut(&str, Vec<Type>) -> Result<Type, E>,
    ) -> Result<Type, E> {
        match self {
            TypeExpr::Con { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.resolve(con))
                    .collect::<Result<Vec<_>, E>>()?;
                con(name, args)
            }
            TypeExpr::Unit => Ok(Type::SINGLETON),
            TypeExpr::Tuple(items) => Ok(Type::tuple(
                items
                    .iter()
                    .map(|item| item.resolve(con))
                    .collect::<Result<Vec<_>, E>>()?,
            )),
            TypeExpr::List(item) => Ok(Type::param("List", vec![item.resolve(con)?])),
            TypeExpr::Func(t1, t2) => Ok(Type::func(t1.resolve(con)?, t2.resolve(con)?)),
        }
    }

    /// Interpret names by shape alone: the atom names are atoms, lowercase
    /// names are variables, everything else is a parameterized constructor.
    pub fn structural(&self) -> Type {
        let mut con = |name: &str, args: Vec<Type>| -> Result<Type, std::convert::Infallible> {
            Ok(match (name, args.is_empty()) {
                ("Int" | "Integer", true) => Type::INT,
                ("Char", true) => Type::CHAR,
                ("Bool", true) => Type::BOOL,
                ("Float" | "Double", true) => Type::FLOAT,
                _ if name.starts_with(|c: char| c.is_lowercase() || c == '_') => {
                    Type::var(name)
                }
                _ => Type::param(name, args),
            })
        };
        match self.resolve(&mut con) {
            Ok(ty) => ty,
            Err(never) => match never {},
        }
    }
}

/// Parse a type signature such as `(Int, Char) -> Bool`.
pub fn parse_type(text: &str) -> Result<TypeExpr, ParseError> {
    let tokens = Token::lex(text).map_err(|err| ParseError::new(err.to_string()).fragment(text))?;
    let mut state = ParseState::new(tokens);
    let expr = signature()
        .parse(&mut state)
        .map_err(|err| err.fragment(text))?;
    finish(&state, text)?;
    Ok(expr)
}

/// Parse an answer of the form `name :: signature`. The name is taken
/// verbatim (operators arrive parenthesized, as in `(+) :: a -> a -> a`).
pub fn parse_declaration(text: &str) -> Result<(String, TypeExpr), ParseError> {
    let (name, signature) = text
        .split_once("::")
        .ok_or_else(|| ParseError::new("missing '::'").fragment(text))?;
    let name = name.trim();
    let name = name
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(name);
    if name.is_empty() {
        return Err(ParseError::new("missing declared name").fragment(text));
    }
    Ok((name.to_string(), parse_type(signature.trim())?))
}

fn finish(state: &ParseState, text: &str) -> Result<(), ParseError> {
    match state.peek() {
        Some(tok) => Err(ParseError::new("trailing input")
            .found(tok.describe())
            .at(tok.pos())
            .fragment(text)),
        None => Ok(()),
    }
}

/// A class context such as `Num a =>` is read and dropped.
fn signature() -> Rule<TypeExpr> {
    optional(application() - fat_arrow()) * function()
}

fn function() -> Rule<TypeExpr> {
    (application() + optional(arrow() * Rule::lazy(function))).map(|(arg, result)| match result {
        Some(result) => TypeExpr::Func(Box::new(arg), Box::new(result)),
        None => arg,
    })
}

fn application() -> Rule<TypeExpr> {
    let atoms = atom().label("type") + many(atom());
    Rule::new(move |state: &mut ParseState| {
        let (head, args) = atoms.parse(state)?;
        if args.is_empty() {
            return Ok(head);
        }
        match head {
            TypeExpr::Con { name, args: existing } if existing.is_empty() => {
                Ok(TypeExpr::Con { name, args })
            }
            other => Err(ParseError::new("cannot apply a non-constructor type")
                .found(format!("{other:?}"))),
        }
    })
}

fn atom() -> Rule<TypeExpr> {
    let name = ident()
        >> (|name: String| TypeExpr::Con {
            name,
            args: Vec::new(),
        });
    let unit = (lparen() + rparen()).map(|_| TypeExpr::Unit);
    let group = (lparen() * sep_by1(Rule::lazy(function), comma()) - rparen()).map(|mut items| {
        if items.len() == 1 {
            items.remove(0)
        } else {
            TypeExpr::Tuple(items)
        }
    });
    let list = (lbracket() * Rule::lazy(function) - rbracket())
        .map(|item| TypeExpr::List(Box::new(item)));

    name | unit | group | list
}
