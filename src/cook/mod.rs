//! # Cooking
//!
//! Elevates a [`RawGraph`] into a typed [`Program`]:
//!
//! 1. resolve every node's type text through the resolver;
//! 2. compute a return type per node from the sinks it reaches (nodes that
//!    reach none, or disagreeing ones, get `r<id>`);
//! 3. register named roots without input as program-local functions
//!    `own -> return`;
//! 4. parse branchers and arrow morphisms against those symbols;
//! 5. connect arrows into pins and incoming lists;
//! 6. check intersection nodes: all-positional inputs, slots `0..n` once each.
//!
//! Any failure aborts before a program is returned.

pub mod oracle;
pub mod parse;
pub mod resolver;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::graph::{
    Arrow, ArrowId, Brancher, GraphError, Node, NodeId, OutPin, PinRef, Program, RawConnection,
    RawGraph, RawNode, RawNodeId,
};
use crate::morphism::MorphismError;
use crate::parser::ParseError;
use crate::types::{Type, parse_type};

pub use oracle::{Oracle, OracleConfig, OracleError};
pub use parse::{parse_brancher, parse_morphism, parse_pattern};
pub use resolver::{Overlay, Symbol, SymbolKind, SymbolResolver, SymbolTable};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CookError {
    #[error("unresolved type `{name}` in `{text}`")]
    UnresolvedType { name: String, text: String },
    #[error("unresolved symbol `{name}` in `{text}`")]
    UnresolvedSymbol { name: String, text: String },
    #[error("unexpected {found} `{name}`")]
    WrongSymbolKind { name: String, found: SymbolKind },
    #[error("guard `{text}` yields {found}, not Bool")]
    GuardNotBoolean { text: String, found: Type },
    #[error("node {node} mixes positional and non-positional inputs")]
    MixedPositional { node: NodeId },
    #[error("node {node}: {reason}")]
    BadPosition { node: NodeId, reason: String },
    #[error("in `{text}`: {source}")]
    Morphism { text: String, source: MorphismError },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Resolve type text, looking constructor names up in `resolver`.
/// Lowercase names are type variables.
pub fn resolve_type(text: &str, resolver: &dyn SymbolResolver) -> Result<Type, CookError> {
    let expr = parse_type(text)?;
    let mut con = |name: &str, args: Vec<Type>| -> Result<Type, CookError> {
        if name.starts_with(|c: char| c.is_lowercase()) {
            return Ok(Type::var(name));
        }
        let symbol = resolver
            .find_symbol(name)
            .ok_or_else(|| CookError::UnresolvedType {
                name: name.to_string(),
                text: text.to_string(),
            })?;
        if symbol.kind != SymbolKind::Type {
            return Err(CookError::WrongSymbolKind {
                name: name.to_string(),
                found: symbol.kind,
            });
        }
        match symbol.ty {
            ty if args.is_empty() => Ok(ty),
            Type::Param {
                name,
                args: existing,
            } if existing.is_empty() => Ok(Type::param(name, args)),
            _ => Err(ParseError::new(format!("type `{name}` takes no arguments"))
                .fragment(text)
                .into()),
        }
    };
    expr.resolve(&mut con)
}

pub fn cook(raw: &RawGraph, resolver: &dyn SymbolResolver) -> Result<Program, CookError> {
    check_connections(raw)?;

    let types = raw
        .nodes
        .iter()
        .map(|node| resolve_type(&node.type_name, resolver))
        .collect::<Result<Vec<_>, _>>()?;
    let return_types = return_types(raw, &types);

    let mut overlay = Overlay::new(resolver);
    let targeted: BTreeSet<usize> = raw.connections.iter().map(|c| c.target.0).collect();
    for (index, node) in raw.nodes.iter().enumerate() {
        let Some(name) = &node.name else {
            continue;
        };
        if !node.has_input && !targeted.contains(&index) {
            let ty = Type::func(types[index].clone(), return_types[index].clone());
            debug!(name = name.as_str(), ty = %ty, "registering program function");
            overlay.insert(name.clone(), Symbol::function(ty));
        }
    }

    let mut nodes = Vec::with_capacity(raw.nodes.len());
    for (index, node) in raw.nodes.iter().enumerate() {
        nodes.push(Node {
            ty: types[index].clone(),
            name: node.name.clone(),
            has_input: node.has_input,
            pins: pins(node, &overlay)?,
            incoming: Vec::new(),
            return_type: return_types[index].clone(),
        });
    }

    let morphisms = raw
        .connections
        .iter()
        .map(|connection| parse_morphism(&connection.text, &overlay))
        .collect::<Result<Vec<_>, _>>()?;

    let mut arrows = Vec::with_capacity(raw.connections.len());
    for (index, (connection, morphism)) in raw.connections.iter().zip(morphisms).enumerate() {
        let id = ArrowId(index);
        nodes[connection.source.0].pins[connection.pin]
            .arrows
            .push(id);
        nodes[connection.target.0].incoming.push(id);
        arrows.push(Arrow {
            source: PinRef {
                node: NodeId(connection.source.0),
                pin: connection.pin,
            },
            target: NodeId(connection.target.0),
            morphism,
            text: connection.text.clone(),
        });
    }

    let program = Program { nodes, arrows };
    check_intersections(&program)?;
    info!(
        nodes = program.node_count(),
        arrows = program.arrow_count(),
        "cooked program"
    );
    Ok(program)
}

/// Raw graphs built field by field skip the checks of [`RawGraph::connect`].
fn check_connections(raw: &RawGraph) -> Result<(), GraphError> {
    for connection in &raw.connections {
        let source = raw
            .nodes
            .get(connection.source.0)
            .ok_or(GraphError::UnknownNode(connection.source.0))?;
        if connection.pin >= source.branchers.len() {
            return Err(GraphError::PinOutOfRange {
                node: connection.source.0,
                pin: connection.pin,
                pins: source.branchers.len(),
            });
        }
        let target = raw
            .nodes
            .get(connection.target.0)
            .ok_or(GraphError::UnknownNode(connection.target.0))?;
        if !target.has_input {
            return Err(GraphError::NoInput(connection.target.0));
        }
    }
    Ok(())
}

fn pins(node: &RawNode, resolver: &dyn SymbolResolver) -> Result<Vec<OutPin>, CookError> {
    let single = node.branchers.len() == 1;
    node.branchers
        .iter()
        .map(|label| -> Result<OutPin, CookError> {
            let brancher = if single {
                Brancher::Any
            } else {
                parse_brancher(label, resolver)?
            };
            Ok(OutPin {
                brancher,
                label: label.clone(),
                arrows: Vec::new(),
            })
        })
        .collect()
}

/// A node returns the type of the sinks it reaches. Nodes that reach no
/// sink, or sinks of different types, get `r<id>` and are left to the walk.
fn return_types(raw: &RawGraph, types: &[Type]) -> Vec<Type> {
    let mut successors = vec![Vec::new(); raw.nodes.len()];
    for connection in &raw.connections {
        successors[connection.source.0].push(connection.target.0);
    }

    (0..raw.nodes.len())
        .map(|start| {
            let mut seen = BTreeSet::from([start]);
            let mut stack = vec![start];
            let mut sinks: Vec<&Type> = Vec::new();
            while let Some(current) = stack.pop() {
                if successors[current].is_empty() && !sinks.contains(&&types[current]) {
                    sinks.push(&types[current]);
                }
                for next in &successors[current] {
                    if seen.insert(*next) {
                        stack.push(*next);
                    }
                }
            }
            match sinks.as_slice() {
                [only] => (*only).clone(),
                _ => Type::var(format!("r{start}")),
            }
        })
        .collect()
}

fn check_intersections(program: &Program) -> Result<(), CookError> {
    for (id, node) in program.nodes() {
        let positional = node
            .incoming
            .iter()
            .filter(|arrow| program.arrow(**arrow).is_positional())
            .count();
        if positional == 0 {
            continue;
        }
        if positional != node.incoming.len() {
            return Err(CookError::MixedPositional { node: id });
        }

        let arity = node.ty.components().len();
        let mut slots = BTreeSet::new();
        for arrow in &node.incoming {
            let Some(Some(slot)) = program.arrow(*arrow).morphism.slot() else {
                continue;
            };
            if slot >= arity {
                return Err(CookError::BadPosition {
                    node: id,
                    reason: format!("slot ${slot} out of range for {}", node.ty),
                });
            }
            if !slots.insert(slot) {
                return Err(CookError::BadPosition {
                    node: id,
                    reason: format!("slot ${slot} filled twice"),
                });
            }
        }
        if slots.len() != arity {
            return Err(CookError::BadPosition {
                node: id,
                reason: format!("{} of {arity} slots filled", slots.len()),
            });
        }
    }
    Ok(())
}

/// Back to the raw form: type text via `Display`, brancher and morphism text
/// as originally written.
pub fn uncook(program: &Program) -> RawGraph {
    RawGraph {
        nodes: program
            .nodes()
            .map(|(_, node)| RawNode {
                type_name: node.ty.to_string(),
                name: node.name.clone(),
                branchers: node.pins.iter().map(|pin| pin.label.clone()).collect(),
                has_input: node.has_input,
            })
            .collect(),
        connections: program
            .arrows()
            .map(|(_, arrow)| RawConnection {
                source: RawNodeId(arrow.source.node.0),
                target: RawNodeId(arrow.target.0),
                pin: arrow.source.pin,
                text: arrow.text.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_type() {
        let prelude = SymbolTable::prelude();
        assert_eq!(
            resolve_type("(Int, [Char])", &prelude).unwrap(),
            Type::tuple(vec![Type::INT, Type::param("List", vec![Type::CHAR])])
        );
        assert_eq!(
            resolve_type("IO ()", &prelude).unwrap(),
            Type::param("IO", vec![Type::SINGLETON])
        );
        assert!(matches!(
            resolve_type("Widget", &prelude),
            Err(CookError::UnresolvedType { name, .. }) if name == "Widget"
        ));
        assert!(matches!(
            resolve_type("not", &prelude),
            Ok(Type::Var(_))
        ));
        assert!(matches!(
            resolve_type("Int Char", &prelude),
            Err(CookError::Parse(_))
        ));
    }

    #[test]
    fn test_return_types_come_from_reachable_sinks() {
        let mut raw = RawGraph::new();
        let a = raw.new_node("()", None, &["_"], false);
        let b = raw.new_node("Int", None, &["?< 4", "_"], true);
        let c = raw.new_node("Char", None, &["_"], true);
        let d = raw.new_node("Bool", None, &[], true);
        raw.connect(a, c, 0, "'x'").unwrap();
        raw.connect(c, d, 0, "== 'y'").unwrap();
        raw.connect(b, d, 0, "$").unwrap();
        raw.connect(b, d, 1, "$").unwrap();

        let types: Vec<Type> = vec![Type::SINGLETON, Type::INT, Type::CHAR, Type::BOOL];
        let found = return_types(&raw, &types);
        assert_eq!(found[a.0], Type::BOOL);
        assert_eq!(found[b.0], Type::BOOL);
        assert_eq!(found[c.0], Type::BOOL);
        assert_eq!(found[d.0], Type::BOOL);
    }

    #[test]
    fn test_cyclic_chain_gets_variable() {
        let mut raw = RawGraph::new();
        let a = raw.new_node("Int", None, &["_"], true);
        let b = raw.new_node("Int", None, &["_"], true);
        raw.connect(a, b, 0, "$").unwrap();
        raw.connect(b, a, 0, "$").unwrap();
        let found = return_types(&raw, &[Type::INT, Type::INT]);
        assert_eq!(found[0], Type::var("r0"));
    }

    #[test]
    fn test_disagreeing_sinks_get_variable() {
        let mut raw = RawGraph::new();
        let a = raw.new_node("Int", None, &["?< 4", "_"], true);
        let b = raw.new_node("Int", None, &[], true);
        let c = raw.new_node("Bool", None, &[], true);
        raw.connect(a, b, 0, "$").unwrap();
        raw.connect(a, c, 1, "> 9").unwrap();
        let found = return_types(&raw, &[Type::INT, Type::INT, Type::BOOL]);
        assert_eq!(found[a.0], Type::var("r0"));
        assert_eq!(found[c.0], Type::BOOL);
    }
}
