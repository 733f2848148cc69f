use lachs::Span;
use thiserror::Error;

use crate::lexer::Token;

/// A malformed fragment of type, morphism or pattern text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct ParseError {
    pub message: String,
    pub fragment: String,
    pub expected: Vec<String>,
    pub found: Option<String>,
    pub span: Option<Span>,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            fragment: String::new(),
            expected: Vec::new(),
            found: None,
            span: None,
        }
    }

    pub fn expected(mut self, what: impl Into<String>) -> Self {
        self.expected = vec![what.into()];
        self
    }

    pub fn found(mut self, what: impl Into<String>) -> Self {
        self.found = Some(what.into());
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach the offending text, keeping the innermost fragment if one is
    /// already set.
    pub fn fragment(mut self, text: impl Into<String>) -> Self {
        if self.fragment.is_empty() {
            self.fragment = text.into();
        }
        self
    }

    fn render(&self) -> String {
        let mut out = self.message.clone();
        if !self.expected.is_empty() {
            out.push_str(&format!(", expected {}", self.expected.join(" or ")));
        }
        if let Some(found) = &self.found {
            out.push_str(&format!(", found {found}"));
        }
        if !self.fragment.is_empty() {
            out.push_str(&format!(" in `{}`", self.fragment));
        }
        out
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// The tokens of one text and a cursor that rules can rewind.
pub struct ParseState {
    tokens: Vec<Token>,
    cursor: usize,
}

impl ParseState {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Consume the current token.
    pub fn bump(&mut self) -> Option<Token> {
        let token = self.peek().cloned()?;
        self.cursor += 1;
        Some(token)
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Run `rule`, putting the cursor back where it was if it fails.
    pub fn attempt<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let mark = self.cursor;
        let result = rule(self);
        if result.is_err() {
            self.cursor = mark;
        }
        result
    }
}

pub trait Parser<T> {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T>;
}

impl<T, F: Fn(&mut ParseState) -> ParseResult<T>> Parser<T> for F {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T> {
        self(state)
    }
}
