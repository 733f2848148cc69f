//! # Condition Algebra
//!
//! Path conditions in disjunctive normal form over branch variables. A
//! positive literal `k` means "branch `k` was taken", `-k` its negation.
//!
//! ```text
//! terms = []                 true
//! terms = [{1}]              1
//! terms = [{1, 2}, {-3}]     1 & 2 | -3
//! ```
//!
//! The algebra is deliberately shallow: `or` with `true` collapses to
//! `true` and implication is a per-term subset test, which is sound for the
//! conjunctions produced by branch discovery but is not a general prover.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Condition {
    terms: Vec<BTreeSet<i32>>,
}

impl Condition {
    pub fn truth() -> Self {
        Condition { terms: Vec::new() }
    }

    pub fn var(literal: i32) -> Self {
        Condition {
            terms: vec![BTreeSet::from([literal])],
        }
    }

    pub fn is_true(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[BTreeSet<i32>] {
        &self.terms
    }

    /// Conjunction: cross product of both term lists.
    pub fn and(&self, other: &Condition) -> Condition {
        if self.is_true() {
            return other.clone();
        }
        if other.is_true() {
            return self.clone();
        }
        let mut terms = Vec::with_capacity(self.terms.len() * other.terms.len());
        for lhs in &self.terms {
            for rhs in &other.terms {
                let term: BTreeSet<i32> = lhs.union(rhs).copied().collect();
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }
        Condition { terms }
    }

    /// Disjunction: concatenation, collapsing to `true` if either side is.
    pub fn or(&self, other: &Condition) -> Condition {
        if self.is_true() || other.is_true() {
            return Condition::truth();
        }
        let mut terms = self.terms.clone();
        for term in &other.terms {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        Condition { terms }
    }

    /// `self => other`, by the subset test: some term of `self` contains
    /// every literal of some term of `other`.
    pub fn does_imply(&self, other: &Condition) -> bool {
        if other.is_true() {
            return true;
        }
        self.terms
            .iter()
            .any(|lhs| other.terms.iter().any(|rhs| rhs.is_subset(lhs)))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_true() {
            return write!(f, "true");
        }
        let terms = self
            .terms
            .iter()
            .map(|term| {
                term.iter()
                    .map(i32::to_string)
                    .collect::<Vec<_>>()
                    .join(" & ")
            })
            .collect::<Vec<_>>();
        write!(f, "{}", terms.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_is_identity_of_and() {
        let a = Condition::var(1);
        assert_eq!(Condition::truth().and(&a), a);
        assert_eq!(a.and(&Condition::truth()), a);
    }

    #[test]
    fn test_and_distributes() {
        let a = Condition::var(1).or(&Condition::var(2));
        let b = Condition::var(3);
        let c = a.and(&b);
        assert_eq!(c.to_string(), "1 & 3 | 2 & 3");
    }

    #[test]
    fn test_or_collapses_with_truth() {
        assert!(Condition::var(1).or(&Condition::truth()).is_true());
        assert!(Condition::truth().or(&Condition::var(1)).is_true());
    }

    #[test]
    fn test_implication() {
        let a = Condition::var(1);
        let ab = a.and(&Condition::var(2));
        assert!(ab.does_imply(&a));
        assert!(!a.does_imply(&ab));
        assert!(a.does_imply(&Condition::truth()));
        assert!(!Condition::truth().does_imply(&a));
        assert!(Condition::truth().does_imply(&Condition::truth()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Condition::truth().to_string(), "true");
        assert_eq!(
            Condition::var(1)
                .and(&Condition::var(2))
                .or(&Condition::var(-3))
                .to_string(),
            "1 & 2 | -3"
        );
    }
}
