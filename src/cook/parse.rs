//! Morphism, brancher and pattern text.
//!
//! ```text
//! morphism := "!" "(" morphism ("," morphism)* ")"   tuple
//!           | "$" digits?                            identity / positional slot
//!           | literal
//!           | "(" morphism ")"
//!           | term term*                             application
//! literal  := int | float | 'c' | "string" | True | False | "()" | "(" -number ")"
//! brancher := "_" | "?" morphism | pattern
//! pattern  := "_" | literal | "(" pattern ("," pattern)+ ")"
//! ```
//!
//! Terms are split on whitespace outside of brackets and quotes. The head of
//! an application is applied to the remaining terms left to right; a bare
//! `$` among them leaves that parameter unbound. A binary operator reads
//! infix: `a + b`, `(+ 1)`, `(2 *)`. Positional slots `$n` are only valid
//! as a whole arrow morphism.

use std::collections::BTreeMap;

use crate::graph::{Brancher, Pattern};
use crate::morphism::{Morphism, Value, is_operator};
use crate::parser::ParseError;
use crate::types::{Type, match_types};

use super::CookError;
use super::resolver::{SymbolKind, SymbolResolver};

/// Parse the text of an arrow.
pub fn parse_morphism(text: &str, resolver: &dyn SymbolResolver) -> Result<Morphism, CookError> {
    let trimmed = text.trim();
    if let Some(digits) = trimmed.strip_prefix('$').filter(|d| !d.is_empty()) {
        let slot = digits.parse::<usize>().map_err(|_| {
            ParseError::new("malformed positional slot")
                .found(trimmed)
                .fragment(text)
        })?;
        return Ok(Morphism::position(Some(slot)));
    }
    Reader { resolver, text }.morphism(trimmed)
}

/// Parse the text of an output pin.
pub fn parse_brancher(text: &str, resolver: &dyn SymbolResolver) -> Result<Brancher, CookError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "_" {
        return Ok(Brancher::Any);
    }
    if let Some(guard) = trimmed.strip_prefix('?') {
        let morphism = Reader { resolver, text }.morphism(guard.trim())?;
        if match_types(&morphism.target(), &Type::BOOL).is_err() {
            return Err(CookError::GuardNotBoolean {
                text: text.to_string(),
                found: morphism.target(),
            });
        }
        return Ok(Brancher::Guard(morphism));
    }
    Ok(Brancher::Pattern(parse_pattern(trimmed)?))
}

pub fn parse_pattern(text: &str) -> Result<Pattern, ParseError> {
    let trimmed = text.trim();
    if trimmed == "_" {
        return Ok(Pattern::Any);
    }
    if let Some(value) = literal(trimmed)? {
        return Ok(Pattern::Value(value));
    }
    if let Some(inner) = enclosed(trimmed)? {
        let items = split_top(inner, |c| c == ',')?;
        if items.len() == 1 {
            return parse_pattern(inner);
        }
        return items
            .into_iter()
            .map(parse_pattern)
            .collect::<Result<Vec<_>, _>>()
            .map(Pattern::Tuple)
            .map_err(|err| err.fragment(text));
    }
    Err(ParseError::new("malformed pattern").fragment(trimmed))
}

struct Reader<'a> {
    resolver: &'a dyn SymbolResolver,
    /// Whole text being read, reported with symbol errors.
    text: &'a str,
}

impl Reader<'_> {
    fn morphism(&self, text: &str) -> Result<Morphism, CookError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::new("empty morphism").fragment(self.text).into());
        }

        if let Some(rest) = text.strip_prefix('!') {
            let inner = enclosed(rest.trim())?
                .ok_or_else(|| ParseError::new("expected '(' after '!'").fragment(text))?;
            let parts = split_top(inner, |c| c == ',')?
                .into_iter()
                .map(|part| self.morphism(part))
                .collect::<Result<Vec<_>, _>>()?;
            return Morphism::tuple(parts).map_err(|source| CookError::Morphism {
                text: text.to_string(),
                source,
            });
        }
        if text == "$" {
            return Ok(Morphism::position(None));
        }
        if text.starts_with('$') {
            return Err(ParseError::new("positional slot inside an expression")
                .found(text)
                .fragment(self.text)
                .into());
        }
        if let Some(value) = literal(text)? {
            return Ok(Morphism::literal(value));
        }

        let terms: Vec<&str> = split_top(text, char::is_whitespace)?
            .into_iter()
            .filter(|term| !term.is_empty())
            .collect();
        match terms.as_slice() {
            [] => Err(ParseError::new("empty morphism").fragment(self.text).into()),
            [term] => match enclosed(term)? {
                Some(inner) => self.morphism(inner),
                None => self.symbol(term),
            },
            [head, args @ ..] => self.application(text, head, args),
        }
    }

    fn application(&self, text: &str, head: &str, args: &[&str]) -> Result<Morphism, CookError> {
        // Infix operator forms: `op b`, `a op`, `a op b`.
        let infix = |term: &str| term != "$" && is_operator(term);
        let (op, bindings) = match (head, args) {
            (op, [rhs]) if infix(op) => (op, vec![(1, *rhs)]),
            (lhs, [op]) if infix(*op) => (*op, vec![(0, lhs)]),
            (lhs, [op, rhs]) if infix(*op) => (*op, vec![(0, lhs), (1, *rhs)]),
            _ => (head, args.iter().copied().enumerate().collect()),
        };
        if op == "$" {
            return Err(ParseError::new("application of a hole")
                .fragment(self.text)
                .into());
        }

        let inner = self.morphism(op)?;
        let arity = inner.param_count();
        if let Some((_, surplus)) = bindings.iter().find(|(index, _)| *index >= arity) {
            let plural = if arity == 1 { "" } else { "s" };
            return Err(ParseError::new(format!("`{op}` takes {arity} argument{plural}"))
                .found(*surplus)
                .fragment(self.text)
                .into());
        }

        let mut mapping = BTreeMap::new();
        for (index, arg) in bindings {
            if arg == "$" {
                continue;
            }
            mapping.insert(index, self.morphism(arg)?);
        }
        if mapping.is_empty() {
            return Ok(inner);
        }
        Morphism::bind(&inner, mapping).map_err(|source| CookError::Morphism {
            text: text.to_string(),
            source,
        })
    }

    fn symbol(&self, name: &str) -> Result<Morphism, CookError> {
        let valid_ident = name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '\'' || c == '.')
            && !name.starts_with(|c: char| c.is_ascii_digit());
        if !valid_ident && !is_operator(name) {
            return Err(ParseError::new("unexpected term")
                .found(name)
                .fragment(self.text)
                .into());
        }
        let symbol = self
            .resolver
            .find_symbol(name)
            .ok_or_else(|| CookError::UnresolvedSymbol {
                name: name.to_string(),
                text: self.text.to_string(),
            })?;
        match symbol.kind {
            SymbolKind::Function => Ok(Morphism::function(name, &symbol.ty)),
            SymbolKind::Value => Ok(Morphism::value(name, symbol.ty)),
            SymbolKind::Type => Err(CookError::WrongSymbolKind {
                name: name.to_string(),
                found: SymbolKind::Type,
            }),
        }
    }
}

/// A literal constant, `None` if `text` is not one.
fn literal(text: &str) -> Result<Option<Value>, ParseError> {
    match text {
        "()" => return Ok(Some(Value::Unit)),
        "True" => return Ok(Some(Value::Bool(true))),
        "False" => return Ok(Some(Value::Bool(false))),
        _ => {}
    }
    if let Some(number) = number(text) {
        return Ok(Some(number));
    }
    let negative = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .and_then(|inner| number(inner.trim()))
        .filter(Value::is_negative);
    if negative.is_some() {
        return Ok(negative);
    }
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        let body = unescape(&text[1..text.len() - 1]).map_err(|err| err.fragment(text))?;
        let mut chars = body.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(Value::Char(c))),
            _ => Err(ParseError::new("character literal must hold one character").fragment(text)),
        };
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        let body = unescape(&text[1..text.len() - 1]).map_err(|err| err.fragment(text))?;
        return Ok(Some(Value::Str(body)));
    }
    Ok(None)
}

fn number(text: &str) -> Option<Value> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if digits.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().ok().map(Value::Int);
    }
    let (whole, fraction) = digits.split_once('.')?;
    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if is_digits(whole) && is_digits(fraction) {
        return text.parse().ok().map(Value::Float);
    }
    None
}

fn unescape(body: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            Some(other) => {
                return Err(ParseError::new("unknown escape").found(format!("\\{other}")));
            }
            None => return Err(ParseError::new("dangling escape")),
        }
    }
    Ok(out)
}

/// The inside of `( ... )` when the opening parenthesis closes at the very end.
fn enclosed(text: &str) -> Result<Option<&str>, ParseError> {
    if !text.starts_with('(') || !text.ends_with(')') {
        return Ok(None);
    }
    let close = closing_paren(text)?;
    if close == text.len() - 1 {
        Ok(Some(&text[1..close]))
    } else {
        Ok(None)
    }
}

/// Byte index of the parenthesis closing the one at index 0.
fn closing_paren(text: &str) -> Result<usize, ParseError> {
    let mut depth = 0usize;
    let mut scanner = Scanner::new(text);
    while let Some((index, c)) = scanner.next()? {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(index);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::new("unbalanced '('").fragment(text))
}

/// Split at every `sep` character outside brackets and quotes.
fn split_top(text: &str, sep: impl Fn(char) -> bool) -> Result<Vec<&str>, ParseError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut scanner = Scanner::new(text);
    while let Some((index, c)) = scanner.next()? {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| ParseError::new(format!("unbalanced '{c}'")).fragment(text))?;
            }
            c if depth == 0 && sep(c) => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::new("unbalanced '('").fragment(text));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

/// Character iterator that steps over quoted literals as a whole, yielding
/// only their opening quote.
struct Scanner<'a> {
    text: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    previous: Option<char>,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Scanner {
            text,
            chars: text.char_indices().peekable(),
            previous: None,
        }
    }

    fn next(&mut self) -> Result<Option<(usize, char)>, ParseError> {
        let Some((index, c)) = self.chars.next() else {
            return Ok(None);
        };
        // `'` inside a name such as `f'` is part of the name.
        let opens_char = c == '\''
            && self
                .previous
                .is_none_or(|p| p.is_whitespace() || p == '(' || p == ',');
        if c == '"' || opens_char {
            self.skip_quoted(c)?;
        }
        self.previous = Some(c);
        Ok(Some((index, c)))
    }

    fn skip_quoted(&mut self, quote: char) -> Result<(), ParseError> {
        while let Some((_, c)) = self.chars.next() {
            if c == '\\' {
                self.chars.next();
            } else if c == quote {
                return Ok(());
            }
        }
        Err(ParseError::new("unterminated literal").fragment(self.text))
    }
}
