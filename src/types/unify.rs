use thiserror::Error;

use super::subst::Mapping;
use super::ty::{Type, TypeVar};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("type mismatch: expected {pattern}, found {concrete}")]
    Mismatch { pattern: Type, concrete: Type },
    #[error("type variable {} already bound to {bound}, found {found}", var.name)]
    Conflict { var: TypeVar, bound: Type, found: Type },
}

/// Match a pattern type against a concrete type.
///
/// This is one-directional matching, not unification: only variables on the
/// pattern side bind, and they bind to whatever sits at the same position on
/// the concrete side. A variable occurring twice must see identical types at
/// both positions.
///
/// ```text
/// match(a -> a, Int -> Int)    = [a := Int]
/// match(a, (Int, Char))        = [a := (Int, Char)]
/// match((a, b), (Int, Char))   = [a := Int, b := Char]
/// match(a -> a, Int -> Char)   = Err(Conflict)
/// match(Int, a)                = Err(Mismatch)
/// ```
pub fn match_types(pattern: &Type, concrete: &Type) -> Result<Mapping, MatchError> {
    let mut mapping = Mapping::empty();
    match_into(pattern, concrete, &mut mapping)?;
    Ok(mapping)
}

fn match_into(pattern: &Type, concrete: &Type, mapping: &mut Mapping) -> Result<(), MatchError> {
    match (pattern, concrete) {
        (Type::Var(v), _) => mapping.bind(v.clone(), concrete.clone()),

        (Type::Atom(a), Type::Atom(b)) if a == b => Ok(()),

        (Type::Tuple(ps), Type::Tuple(cs)) if ps.len() == cs.len() => {
            for (p, c) in ps.iter().zip(cs) {
                match_into(p, c, mapping)?;
            }
            Ok(())
        }

        (
            Type::Param { name: pn, args: pa },
            Type::Param { name: cn, args: ca },
        ) if pn == cn && pa.len() == ca.len() => {
            for (p, c) in pa.iter().zip(ca) {
                match_into(p, c, mapping)?;
            }
            Ok(())
        }

        (Type::Func(p1, p2), Type::Func(c1, c2)) => {
            match_into(p1, c1, mapping)?;
            match_into(p2, c2, mapping)
        }

        _ => Err(MatchError::Mismatch {
            pattern: pattern.clone(),
            concrete: concrete.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_identical_atoms() {
        assert_eq!(match_types(&Type::INT, &Type::INT), Ok(Mapping::empty()));
        assert_eq!(match_types(&Type::BOOL, &Type::BOOL), Ok(Mapping::empty()));
    }

    #[test]
    fn test_match_atom_mismatch() {
        let result = match_types(&Type::INT, &Type::CHAR);
        assert!(matches!(result, Err(MatchError::Mismatch { .. })));
    }

    #[test]
    fn test_match_var_with_concrete() {
        let result = match_types(&Type::var("a"), &Type::INT);
        assert_eq!(result, Ok(Mapping::singleton(TypeVar::new("a"), Type::INT)));
    }

    #[test]
    fn test_concrete_var_does_not_bind() {
        let result = match_types(&Type::INT, &Type::var("a"));
        assert!(matches!(result, Err(MatchError::Mismatch { .. })));
    }

    #[test]
    fn test_var_binds_whole_tuple() {
        let pair = Type::tuple(vec![Type::INT, Type::CHAR]);
        let mapping = match_types(&Type::var("a"), &pair).unwrap();
        assert_eq!(mapping.get(&TypeVar::new("a")), Some(&pair));
    }

    #[test]
    fn test_tuple_arity_mismatch() {
        let pattern = Type::tuple(vec![Type::var("a"), Type::var("b")]);
        let concrete = Type::tuple(vec![Type::INT, Type::INT, Type::INT]);
        assert!(match_types(&pattern, &concrete).is_err());
    }

    #[test]
    fn test_repeated_var_must_agree() {
        let pattern = Type::func(Type::var("a"), Type::var("a"));
        assert!(match_types(&pattern, &Type::func(Type::INT, Type::INT)).is_ok());
        let result = match_types(&pattern, &Type::func(Type::INT, Type::CHAR));
        assert!(matches!(result, Err(MatchError::Conflict { .. })));
    }

    #[test]
    fn test_two_vars_are_not_unified() {
        // `a` binds to the concrete variable `b`, it does not merge them
        let mapping = match_types(&Type::var("a"), &Type::var("b")).unwrap();
        assert_eq!(mapping.get(&TypeVar::new("a")), Some(&Type::var("b")));
    }

    #[test]
    fn test_match_parameterized() {
        let pattern = Type::param("IO", vec![Type::var("a")]);
        let mapping = match_types(&pattern, &Type::param("IO", vec![Type::INT])).unwrap();
        assert_eq!(mapping.apply(&Type::var("a")), Type::INT);
        assert!(match_types(&pattern, &Type::param("Maybe", vec![Type::INT])).is_err());
    }

    #[test]
    fn test_match_function_threading() {
        let pattern = Type::curried(&[Type::var("a"), Type::var("a")], Type::BOOL);
        let concrete = Type::curried(&[Type::FLOAT, Type::FLOAT], Type::BOOL);
        let mapping = match_types(&pattern, &concrete).unwrap();
        assert_eq!(mapping.apply(&pattern), concrete);
    }
}
