use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::parser::ParseError;
use crate::types::{Type, parse_declaration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Function,
    Value,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SymbolKind::Type => write!(f, "type"),
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::Value => write!(f, "value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub ty: Type,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn ty(ty: Type) -> Self {
        Symbol {
            ty,
            kind: SymbolKind::Type,
        }
    }

    pub fn function(ty: Type) -> Self {
        Symbol {
            ty,
            kind: SymbolKind::Function,
        }
    }

    pub fn value(ty: Type) -> Self {
        Symbol {
            ty,
            kind: SymbolKind::Value,
        }
    }

    /// Function when the declared type is a function type, value otherwise.
    pub fn declared(ty: Type) -> Self {
        if ty.is_function() {
            Symbol::function(ty)
        } else {
            Symbol::value(ty)
        }
    }
}

/// Lookup of names used in type and morphism text.
pub trait SymbolResolver {
    fn find_symbol(&self, name: &str) -> Option<Symbol>;
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atom types, `String`, `List`, `IO` and the builtin operators.
    pub fn prelude() -> Self {
        let a = Type::var("a");
        let b = Type::var("b");
        let binary = |t: &Type| Type::curried(&[t.clone(), t.clone()], t.clone());
        let compare = Type::curried(&[a.clone(), a.clone()], Type::BOOL);

        let mut table = SymbolTable::new();
        for (name, ty) in [
            ("Int", Type::INT),
            ("Integer", Type::INT),
            ("Char", Type::CHAR),
            ("Bool", Type::BOOL),
            ("Float", Type::FLOAT),
            ("Double", Type::FLOAT),
            ("String", Type::string()),
            ("List", Type::param("List", Vec::new())),
            ("IO", Type::param("IO", Vec::new())),
        ] {
            table.insert(name, Symbol::ty(ty));
        }

        for name in ["+", "-", "*", "/"] {
            table.insert(name, Symbol::function(binary(&a)));
        }
        for name in ["div", "mod"] {
            table.insert(name, Symbol::function(binary(&Type::INT)));
        }
        for name in ["<", "<=", ">", ">=", "==", "/="] {
            table.insert(name, Symbol::function(compare.clone()));
        }
        for name in ["&&", "||"] {
            table.insert(name, Symbol::function(binary(&Type::BOOL)));
        }
        table.insert("not", Symbol::function(Type::func(Type::BOOL, Type::BOOL)));
        table.insert("negate", Symbol::function(Type::func(a.clone(), a.clone())));
        table.insert(
            "fst",
            Symbol::function(Type::func(Type::tuple(vec![a.clone(), b.clone()]), a.clone())),
        );
        table.insert(
            "snd",
            Symbol::function(Type::func(Type::tuple(vec![a, b.clone()]), b)),
        );
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.symbols.insert(name.into(), symbol);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Add declarations, one per line:
    ///
    /// ```text
    /// -- comment
    /// type Maybe
    /// succ :: Int -> Int
    /// (<>) :: String -> String -> String
    /// ```
    ///
    /// Returns the number of symbols added.
    pub fn load(&mut self, text: &str) -> Result<usize, ParseError> {
        let mut added = 0;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("--") {
                continue;
            }
            if let Some(name) = line.strip_prefix("type ") {
                let name = name.trim();
                self.insert(name, Symbol::ty(Type::param(name, Vec::new())));
            } else {
                let (name, expr) = parse_declaration(line)?;
                self.insert(name, Symbol::declared(expr.structural()));
            }
            added += 1;
        }
        debug!(added, "loaded symbol declarations");
        Ok(added)
    }
}

impl SymbolResolver for SymbolTable {
    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).cloned()
    }
}

/// Program-local symbols shadowing a parent resolver.
pub struct Overlay<'a> {
    parent: &'a dyn SymbolResolver,
    local: SymbolTable,
}

impl<'a> Overlay<'a> {
    pub fn new(parent: &'a dyn SymbolResolver) -> Self {
        Overlay {
            parent,
            local: SymbolTable::new(),
        }
    }

    /// `local` shadows `parent`.
    pub fn with_table(parent: &'a dyn SymbolResolver, local: SymbolTable) -> Self {
        Overlay { parent, local }
    }

    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.local.insert(name, symbol);
    }
}

impl SymbolResolver for Overlay<'_> {
    fn find_symbol(&self, name: &str) -> Option<Symbol> {
        self.local
            .find_symbol(name)
            .or_else(|| self.parent.find_symbol(name))
    }
}
