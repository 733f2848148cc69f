//! # Scope/Branch Builder
//!
//! Accretes definitions into a tree of lexical scopes keyed by path
//! condition, then extracts the nested structure a backend renders.
//!
//! ```text
//! add_definition(true, a)             root: [a]
//! add_branches(true, [x, y])          root: [a] -> x: 1, y: 2
//! add_definition(1, b)                x: [b]
//! add_definition(true, c)             x: [b, c]   y: [c]
//! close_scope(true)                   nothing active; extract() succeeds
//! ```
//!
//! Only leaf scopes that are still open ("active") receive definitions. A
//! scope receives a definition when its own condition implies the
//! definition's condition, so a value computed before a fork is copied into
//! every branch that is still being built.

use std::mem;

use thiserror::Error;

use crate::condition::Condition;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("{open} scope(s) still open at extraction")]
    Unclosed { open: usize },
    #[error("branch under `{condition}` has no definitions")]
    EmptyBranch { condition: String },
}

/// Extracted scope: its own definitions followed by a dispatch over the
/// labelled child blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<D, L> {
    pub definitions: Vec<D>,
    pub branches: Vec<(L, Block<D, L>)>,
}

impl<D, L> Block<D, L> {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.branches.is_empty()
    }
}

#[derive(Debug)]
struct Scope<D, L> {
    condition: Condition,
    definitions: Vec<D>,
    children: Vec<(L, usize)>,
}

impl<D, L> Scope<D, L> {
    fn new(condition: Condition) -> Self {
        Scope {
            condition,
            definitions: Vec::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct ScopeBuilder<D, L> {
    scopes: Vec<Scope<D, L>>,
    active: Vec<usize>,
    next_var: i32,
}

impl<D: Clone, L: Clone> Default for ScopeBuilder<D, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Clone, L: Clone> ScopeBuilder<D, L> {
    pub fn new() -> Self {
        ScopeBuilder {
            scopes: vec![Scope::new(Condition::truth())],
            active: vec![0],
            next_var: 1,
        }
    }

    fn fresh_var(&mut self) -> i32 {
        let var = self.next_var;
        self.next_var += 1;
        var
    }

    fn receiving(&self, condition: &Condition) -> Vec<usize> {
        self.active
            .iter()
            .copied()
            .filter(|id| self.scopes[*id].condition.does_imply(condition))
            .collect()
    }

    /// Append `def` to every active scope implied by `condition`. Returns the
    /// number of scopes that received it.
    pub fn add_definition(&mut self, condition: &Condition, def: D) -> usize {
        let receiving = self.receiving(condition);
        for id in &receiving {
            self.scopes[*id].definitions.push(def.clone());
        }
        receiving.len()
    }

    /// Fork every active scope implied by `condition` into one child per
    /// label. Returns `condition ∧ v_k` for each label, in order.
    pub fn add_branches(&mut self, condition: &Condition, labels: Vec<L>) -> Vec<Condition> {
        let vars: Vec<i32> = labels.iter().map(|_| self.fresh_var()).collect();
        let receiving = self.receiving(condition);

        let mut active = Vec::with_capacity(self.active.len() + receiving.len() * labels.len());
        for id in mem::take(&mut self.active) {
            if !receiving.contains(&id) {
                active.push(id);
                continue;
            }
            for (label, var) in labels.iter().zip(&vars) {
                let child = self.scopes.len();
                let child_condition = self.scopes[id].condition.and(&Condition::var(*var));
                self.scopes.push(Scope::new(child_condition));
                self.scopes[id].children.push((label.clone(), child));
                active.push(child);
            }
        }
        self.active = active;

        vars.into_iter()
            .map(|var| condition.and(&Condition::var(var)))
            .collect()
    }

    /// Stop building every active scope implied by `condition`. Returns the
    /// number of scopes closed.
    pub fn close_scope(&mut self, condition: &Condition) -> usize {
        let before = self.active.len();
        let scopes = &self.scopes;
        self.active
            .retain(|id| !scopes[*id].condition.does_imply(condition));
        before - self.active.len()
    }

    pub fn open_scopes(&self) -> usize {
        self.active.len()
    }

    pub fn extract(mut self) -> Result<Block<D, L>, ScopeError> {
        if !self.active.is_empty() {
            return Err(ScopeError::Unclosed {
                open: self.active.len(),
            });
        }
        self.extract_scope(0)
    }

    fn extract_scope(&mut self, id: usize) -> Result<Block<D, L>, ScopeError> {
        let definitions = mem::take(&mut self.scopes[id].definitions);
        let children = mem::take(&mut self.scopes[id].children);
        let mut branches = Vec::with_capacity(children.len());
        for (label, child) in children {
            let block = self.extract_scope(child)?;
            if block.is_empty() {
                return Err(ScopeError::EmptyBranch {
                    condition: self.scopes[child].condition.to_string(),
                });
            }
            branches.push((label, block));
        }
        Ok(Block {
            definitions,
            branches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Builder = ScopeBuilder<&'static str, &'static str>;

    #[test]
    fn test_linear_scope() {
        let mut builder = Builder::new();
        let t = Condition::truth();
        assert_eq!(builder.add_definition(&t, "a"), 1);
        assert_eq!(builder.add_definition(&t, "b"), 1);
        assert_eq!(builder.close_scope(&t), 1);
        let block = builder.extract().unwrap();
        assert_eq!(block.definitions, vec!["a", "b"]);
        assert!(block.branches.is_empty());
    }

    #[test]
    fn test_branches_receive_shared_definitions() {
        let mut builder = Builder::new();
        let t = Condition::truth();
        builder.add_definition(&t, "a");
        let conds = builder.add_branches(&t, vec!["x", "y"]);
        assert_eq!(conds, vec![Condition::var(1), Condition::var(2)]);

        assert_eq!(builder.add_definition(&conds[0], "b"), 1);
        assert_eq!(builder.add_definition(&t, "c"), 2);
        assert_eq!(builder.close_scope(&conds[0]), 1);
        assert_eq!(builder.close_scope(&conds[1]), 1);

        let block = builder.extract().unwrap();
        assert_eq!(block.definitions, vec!["a"]);
        assert_eq!(block.branches.len(), 2);
        assert_eq!(block.branches[0].0, "x");
        assert_eq!(block.branches[0].1.definitions, vec!["b", "c"]);
        assert_eq!(block.branches[1].1.definitions, vec!["c"]);
    }

    #[test]
    fn test_nested_branches() {
        let mut builder = Builder::new();
        let t = Condition::truth();
        let outer = builder.add_branches(&t, vec!["l", "r"]);
        let inner = builder.add_branches(&outer[0], vec!["ll", "lr"]);
        assert_eq!(inner[0], Condition::var(1).and(&Condition::var(3)));

        builder.add_definition(&inner[0], "p");
        builder.add_definition(&inner[1], "q");
        builder.add_definition(&outer[1], "s");
        assert_eq!(builder.close_scope(&t), 3);

        let block = builder.extract().unwrap();
        let (_, left) = &block.branches[0];
        assert_eq!(left.branches[0].1.definitions, vec!["p"]);
        assert_eq!(left.branches[1].1.definitions, vec!["q"]);
        assert_eq!(block.branches[1].1.definitions, vec!["s"]);
    }

    #[test]
    fn test_definition_with_unreachable_condition_lands_nowhere() {
        let mut builder = Builder::new();
        let ghost = Condition::var(99);
        assert_eq!(builder.add_definition(&ghost, "x"), 0);
    }

    #[test]
    fn test_unclosed_scope() {
        let mut builder = Builder::new();
        let t = Condition::truth();
        let conds = builder.add_branches(&t, vec!["x", "y"]);
        builder.add_definition(&t, "a");
        builder.close_scope(&conds[0]);
        assert_eq!(
            builder.extract().unwrap_err(),
            ScopeError::Unclosed { open: 1 }
        );
    }

    #[test]
    fn test_empty_branch() {
        let mut builder = Builder::new();
        let t = Condition::truth();
        let conds = builder.add_branches(&t, vec!["x", "y"]);
        builder.add_definition(&conds[0], "a");
        builder.close_scope(&t);
        assert!(matches!(
            builder.extract(),
            Err(ScopeError::EmptyBranch { .. })
        ));
    }

    #[test]
    fn test_variables_are_per_builder() {
        let mut first = Builder::new();
        let mut second = Builder::new();
        let t = Condition::truth();
        first.add_branches(&t, vec!["a"]);
        assert_eq!(second.add_branches(&t, vec!["a"]), vec![Condition::var(1)]);
    }
}
