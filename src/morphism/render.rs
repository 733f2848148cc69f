use std::collections::BTreeMap;
use std::fmt;

use super::{Morphism, MorphismKind};

impl Morphism {
    /// Canonical text, re-parseable by the morphism reader.
    ///
    /// ```text
    /// (+)        operator alone
    /// 9 + 42     operator with both sides bound
    /// (+ 1)      right section
    /// (2 *)      left section
    /// f $ 'c'    prefix application, `$` marks an unbound hole
    /// !(a, b)    tuple
    /// ```
    pub fn render(&self) -> String {
        match self.kind() {
            MorphismKind::Common { name } if super::is_operator(name) => format!("({name})"),
            MorphismKind::Common { name } => name.clone(),
            MorphismKind::Position(None) => "$".to_string(),
            MorphismKind::Position(Some(slot)) => format!("${slot}"),
            MorphismKind::Literal(value) => value.to_string(),
            MorphismKind::Tuple(parts) => format!(
                "!({})",
                parts
                    .iter()
                    .map(Morphism::render)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            MorphismKind::Binded { inner, bindings } => render_binded(inner, bindings),
        }
    }

    /// Render for use as an argument, parenthesizing anything that would not
    /// read back as a single token.
    pub fn shielded(&self) -> String {
        if self.is_atomic() {
            self.render()
        } else {
            format!("({})", self.render())
        }
    }

    fn is_atomic(&self) -> bool {
        match self.kind() {
            MorphismKind::Common { .. } | MorphismKind::Position(_) | MorphismKind::Tuple(_) => {
                true
            }
            MorphismKind::Literal(value) => !value.is_negative(),
            MorphismKind::Binded { inner, bindings } => {
                section(inner, bindings).is_some() && bindings.len() == 1
            }
        }
    }
}

/// Infix form for a binary operator, if `inner` is one.
fn section(inner: &Morphism, bindings: &BTreeMap<usize, Morphism>) -> Option<String> {
    let name = inner.name()?;
    if !super::is_operator(name) || inner.param_count() != 2 {
        return None;
    }
    match (bindings.get(&0), bindings.get(&1)) {
        (Some(lhs), Some(rhs)) => Some(format!("{} {name} {}", lhs.shielded(), rhs.shielded())),
        (None, Some(rhs)) => Some(format!("({name} {})", rhs.shielded())),
        (Some(lhs), None) => Some(format!("({} {name})", lhs.shielded())),
        (None, None) => None,
    }
}

fn render_binded(inner: &Morphism, bindings: &BTreeMap<usize, Morphism>) -> String {
    if let Some(text) = section(inner, bindings) {
        return text;
    }
    let last = bindings.keys().next_back().copied().unwrap_or(0);
    let mut out = inner.shielded();
    for index in 0..=last {
        out.push(' ');
        match bindings.get(&index) {
            Some(arg) => out.push_str(&arg.shielded()),
            None => out.push('$'),
        }
    }
    out
}

impl fmt::Display for Morphism {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
