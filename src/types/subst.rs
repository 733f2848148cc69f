use std::collections::BTreeMap;

use super::ty::{Type, TypeVar};
use super::unify::MatchError;

/// Variable bindings produced by [`super::match_types`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping(pub BTreeMap<TypeVar, Type>);

impl Mapping {
    pub fn empty() -> Self {
        Mapping(BTreeMap::new())
    }

    pub fn singleton(var: TypeVar, ty: Type) -> Self {
        Mapping(BTreeMap::from([(var, ty)]))
    }

    pub fn get(&self, var: &TypeVar) -> Option<&Type> {
        self.0.get(var)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Atom(_) => ty.clone(),
            Type::Var(v) => self.0.get(v).cloned().unwrap_or_else(|| ty.clone()),
            Type::Tuple(items) => Type::Tuple(items.iter().map(|t| self.apply(t)).collect()),
            Type::Param { name, args } => Type::Param {
                name: name.clone(),
                args: args.iter().map(|t| self.apply(t)).collect(),
            },
            Type::Func(t1, t2) => Type::func(self.apply(t1), self.apply(t2)),
        }
    }

    /// Records `var := ty`. The first binding wins; a later binding of the
    /// same variable must agree with it exactly.
    pub fn bind(&mut self, var: TypeVar, ty: Type) -> Result<(), MatchError> {
        match self.0.get(&var) {
            Some(existing) if *existing == ty => Ok(()),
            Some(existing) => Err(MatchError::Conflict {
                var,
                bound: existing.clone(),
                found: ty,
            }),
            None => {
                self.0.insert(var, ty);
                Ok(())
            }
        }
    }

    /// Union of two mappings, failing when they disagree on a variable.
    pub fn merge(mut self, other: Mapping) -> Result<Mapping, MatchError> {
        for (var, ty) in other.0 {
            self.bind(var, ty)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mapping() {
        let mapping = Mapping::empty();
        assert_eq!(mapping.apply(&Type::INT), Type::INT);
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_apply_nested() {
        let mapping = Mapping::singleton(TypeVar::new("a"), Type::INT);
        let ty = Type::func(
            Type::tuple(vec![Type::var("a"), Type::CHAR]),
            Type::param("IO", vec![Type::var("a")]),
        );
        assert_eq!(
            mapping.apply(&ty),
            Type::func(
                Type::tuple(vec![Type::INT, Type::CHAR]),
                Type::param("IO", vec![Type::INT])
            )
        );
    }

    #[test]
    fn test_apply_preserves_unbound_vars() {
        let mapping = Mapping::singleton(TypeVar::new("a"), Type::INT);
        assert_eq!(mapping.apply(&Type::var("b")), Type::var("b"));
    }

    #[test]
    fn test_bind_first_wins() {
        let mut mapping = Mapping::empty();
        mapping.bind(TypeVar::new("a"), Type::INT).unwrap();
        assert!(mapping.bind(TypeVar::new("a"), Type::INT).is_ok());
        assert!(matches!(
            mapping.bind(TypeVar::new("a"), Type::BOOL),
            Err(MatchError::Conflict { .. })
        ));
        assert_eq!(mapping.get(&TypeVar::new("a")), Some(&Type::INT));
    }

    #[test]
    fn test_merge() {
        let left = Mapping::singleton(TypeVar::new("a"), Type::INT);
        let right = Mapping::singleton(TypeVar::new("b"), Type::CHAR);
        let merged = left.clone().merge(right).unwrap();
        assert_eq!(merged.len(), 2);

        let conflicting = Mapping::singleton(TypeVar::new("a"), Type::CHAR);
        assert!(left.merge(conflicting).is_err());
    }
}
