use std::collections::BTreeSet;
use std::fmt;

/// Primitive type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom {
    Int,
    Char,
    Bool,
    Float,
    /// The unit-like type with exactly one value, written `()`.
    Singleton,
    /// Sentinel for "whatever flows into a morphism" before it is attached.
    Source,
    /// Sentinel for "whatever flows out of a morphism" before it is attached.
    Target,
}

impl Atom {
    pub fn name(&self) -> &'static str {
        match self {
            Atom::Int => "Int",
            Atom::Char => "Char",
            Atom::Bool => "Bool",
            Atom::Float => "Float",
            Atom::Singleton => "()",
            Atom::Source => "^source",
            Atom::Target => "^target",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVar {
    pub name: String,
}

impl TypeVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Structural type. Equality is structural, so two types are equal exactly
/// when their canonical renderings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Atom(Atom),
    Tuple(Vec<Type>),
    Param { name: String, args: Vec<Type> },
    Var(TypeVar),
    Func(Box<Type>, Box<Type>),
}

impl Type {
    pub const INT: Type = Type::Atom(Atom::Int);
    pub const CHAR: Type = Type::Atom(Atom::Char);
    pub const BOOL: Type = Type::Atom(Atom::Bool);
    pub const FLOAT: Type = Type::Atom(Atom::Float);
    pub const SINGLETON: Type = Type::Atom(Atom::Singleton);
    pub const SOURCE: Type = Type::Atom(Atom::Source);
    pub const TARGET: Type = Type::Atom(Atom::Target);

    pub fn var(name: impl Into<String>) -> Self {
        Type::Var(TypeVar::new(name))
    }

    pub fn func(t1: Type, t2: Type) -> Self {
        Type::Func(Box::new(t1), Box::new(t2))
    }

    /// Alias of [`Type::func`] named after the operation it performs.
    pub fn curry(arg: Type, result: Type) -> Self {
        Type::func(arg, result)
    }

    pub fn param(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::Param {
            name: name.into(),
            args,
        }
    }

    pub fn string() -> Self {
        Type::param("String", Vec::new())
    }

    /// Builds a tuple, collapsing the degenerate arities: no components is
    /// the singleton type, one component is that component.
    pub fn tuple(mut components: Vec<Type>) -> Self {
        match components.len() {
            0 => Type::SINGLETON,
            1 => components.remove(0),
            _ => Type::Tuple(components),
        }
    }

    /// Folds `params` right-to-left into a curried function ending in `result`.
    pub fn curried(params: &[Type], result: Type) -> Self {
        params
            .iter()
            .rev()
            .fold(result, |acc, param| Type::func(param.clone(), acc))
    }

    /// Splits a curried function type into its parameter list and final result.
    pub fn uncurry(&self) -> (Vec<Type>, Type) {
        let mut params = Vec::new();
        let mut current = self;
        while let Type::Func(arg, result) = current {
            params.push((**arg).clone());
            current = result;
        }
        (params, current.clone())
    }

    /// Tuple components, or the type itself for anything that is not a tuple.
    pub fn components(&self) -> Vec<Type> {
        match self {
            Type::Tuple(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Func(_, _))
    }

    pub fn free_type_vars(&self) -> BTreeSet<TypeVar> {
        match self {
            Type::Atom(_) => BTreeSet::new(),
            Type::Var(v) => BTreeSet::from([v.clone()]),
            Type::Tuple(items) | Type::Param { args: items, .. } => items
                .iter()
                .flat_map(|item| item.free_type_vars())
                .collect(),
            Type::Func(t1, t2) => {
                let mut set = t1.free_type_vars();
                set.extend(t2.free_type_vars());
                set
            }
        }
    }

    pub fn is_ground(&self) -> bool {
        self.free_type_vars().is_empty()
    }

    pub fn pretty(&self) -> String {
        match self {
            Type::Atom(atom) => atom.name().to_string(),
            Type::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Type::pretty).collect();
                format!("({})", inner.join(", "))
            }
            Type::Param { name, args } => {
                let mut out = name.clone();
                for arg in args {
                    out.push(' ');
                    match arg {
                        Type::Func(_, _) | Type::Param { .. } if !arg.is_nullary() => {
                            out.push_str(&format!("({})", arg.pretty()))
                        }
                        _ => out.push_str(&arg.pretty()),
                    }
                }
                out
            }
            Type::Var(v) => v.name.clone(),
            Type::Func(t1, t2) => {
                let t1_str = if matches!(**t1, Type::Func(_, _)) {
                    format!("({})", t1.pretty())
                } else {
                    t1.pretty()
                };
                format!("{} -> {}", t1_str, t2.pretty())
            }
        }
    }

    fn is_nullary(&self) -> bool {
        matches!(self, Type::Param { args, .. } if args.is_empty())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}
