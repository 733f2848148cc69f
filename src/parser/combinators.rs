//! Rules compose with operators:
//!
//! ```text
//! a + b    both, as a pair
//! a - b    both, keep a
//! a * b    both, keep b
//! a | b    a, or b from the same position
//! a >> f   a, mapped through f
//! ```

use std::ops::{Add, BitOr, Mul, Shr, Sub};
use std::rc::Rc;

use crate::lexer::Token;

use super::state::{ParseError, ParseResult, ParseState, Parser};

/// A shareable, type-erased parser.
pub struct Rule<T>(Rc<dyn Fn(&mut ParseState) -> ParseResult<T>>);

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Rule(Rc::clone(&self.0))
    }
}

impl<T> Parser<T> for Rule<T> {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T> {
        (self.0)(state)
    }
}

impl<T: 'static> Rule<T> {
    pub fn new(parser: impl Parser<T> + 'static) -> Self {
        Rule(Rc::new(move |state| parser.parse(state)))
    }

    /// Build the rule on first use, so grammars can refer to themselves.
    pub fn lazy(build: fn() -> Rule<T>) -> Self {
        Rule::new(move |state: &mut ParseState| build().parse(state))
    }

    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Rule<U> {
        Rule::new(move |state: &mut ParseState| self.parse(state).map(&f))
    }

    /// Report failures as "expected `name`".
    pub fn label(self, name: &'static str) -> Rule<T> {
        Rule::new(move |state: &mut ParseState| {
            self.parse(state).map_err(|err| err.expected(name))
        })
    }
}

impl<T: 'static, U: 'static> Add<Rule<U>> for Rule<T> {
    type Output = Rule<(T, U)>;

    fn add(self, rhs: Rule<U>) -> Self::Output {
        Rule::new(move |state: &mut ParseState| Ok((self.parse(state)?, rhs.parse(state)?)))
    }
}

impl<T: 'static, U: 'static> Sub<Rule<U>> for Rule<T> {
    type Output = Rule<T>;

    fn sub(self, rhs: Rule<U>) -> Self::Output {
        Rule::new(move |state: &mut ParseState| {
            let kept = self.parse(state)?;
            rhs.parse(state)?;
            Ok(kept)
        })
    }
}

impl<T: 'static, U: 'static> Mul<Rule<U>> for Rule<T> {
    type Output = Rule<U>;

    fn mul(self, rhs: Rule<U>) -> Self::Output {
        Rule::new(move |state: &mut ParseState| {
            self.parse(state)?;
            rhs.parse(state)
        })
    }
}

impl<T: 'static> BitOr<Rule<T>> for Rule<T> {
    type Output = Rule<T>;

    fn bitor(self, rhs: Rule<T>) -> Self::Output {
        Rule::new(move |state: &mut ParseState| {
            state
                .attempt(|state| self.parse(state))
                .or_else(|_| rhs.parse(state))
        })
    }
}

impl<T: 'static, U: 'static, F: Fn(T) -> U + 'static> Shr<F> for Rule<T> {
    type Output = Rule<U>;

    fn shr(self, f: F) -> Self::Output {
        self.map(f)
    }
}

fn token(expected: &'static str, accepts: fn(&Token) -> bool) -> Rule<Token> {
    Rule::new(move |state: &mut ParseState| {
        let end = || ParseError::new("unexpected end of input").expected(expected);
        let Some(tok) = state.peek() else {
            return Err(end());
        };
        if !accepts(tok) {
            return Err(ParseError::new("unexpected token")
                .expected(expected)
                .found(tok.describe())
                .at(tok.pos()));
        }
        state.bump().ok_or_else(end)
    })
}

macro_rules! punctuation {
    ($($name:ident => $variant:ident $text:literal),* $(,)?) => {
        $(
            pub fn $name() -> Rule<Token> {
                token($text, |tok| matches!(tok, Token::$variant(_)))
            }
        )*
    };
}

punctuation! {
    arrow => Arrow "'->'",
    fat_arrow => FatArrow "'=>'",
    comma => Comma "','",
    lparen => LParen "'('",
    rparen => RParen "')'",
    lbracket => LBracket "'['",
    rbracket => RBracket "']'",
}

pub fn ident() -> Rule<String> {
    token("identifier", |tok| matches!(tok, Token::Ident(_))).map(|tok| match tok {
        Token::Ident(inner) => inner.value,
        other => other.describe(),
    })
}

/// Zero or more; stops at the first failure without consuming it.
pub fn many<T: 'static>(item: Rule<T>) -> Rule<Vec<T>> {
    Rule::new(move |state: &mut ParseState| {
        let mut items = Vec::new();
        while let Ok(next) = state.attempt(|state| item.parse(state)) {
            items.push(next);
        }
        Ok(items)
    })
}

pub fn optional<T: 'static>(item: Rule<T>) -> Rule<Option<T>> {
    Rule::new(move |state: &mut ParseState| Ok(state.attempt(|state| item.parse(state)).ok()))
}

pub fn sep_by1<T: 'static, S: 'static>(item: Rule<T>, separator: Rule<S>) -> Rule<Vec<T>> {
    (item.clone() + many(separator * item)).map(|(first, rest)| {
        let mut items = vec![first];
        items.extend(rest);
        items
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str) -> ParseState {
        ParseState::new(Token::lex(text).unwrap())
    }

    #[test]
    fn test_choice_rewinds() {
        let pair = (ident() - arrow()) | (ident() - comma());
        let mut input = state("a , b");
        assert_eq!(pair.parse(&mut input).unwrap(), "a");
        assert_eq!(ident().parse(&mut input).unwrap(), "b");
        assert!(input.at_end());
    }

    #[test]
    fn test_separated() {
        let names = sep_by1(ident(), comma());
        let mut input = state("a, b, c )");
        assert_eq!(names.parse(&mut input).unwrap(), vec!["a", "b", "c"]);
        assert!(rparen().parse(&mut input).is_ok());
    }

    #[test]
    fn test_errors_name_expectation() {
        let err = arrow().parse(&mut state("Int")).unwrap_err();
        assert_eq!(err.expected, vec!["'->'".to_string()]);
        assert_eq!(err.found.as_deref(), Some("identifier 'Int'"));
    }
}
