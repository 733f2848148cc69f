//! # Program Graph
//!
//! The typed program is an arena: nodes and arrows live in two vectors and
//! refer to each other through [`NodeId`] / [`ArrowId`] handles.
//!
//! ```text
//!  Node ──pins──> OutPin ──arrows──> Arrow ──target──> Node
//!   ^                                  │
//!   └──────────── incoming ────────────┘
//! ```
//!
//! A node without incoming arrows is a root; a node whose pins own no arrows
//! is a sink. Every incoming arrow of an intersection node is positional
//! (`$n`), every incoming arrow of any other node is not.
//!
//! Typed programs are only built by [`crate::cook::cook`]; [`raw`] holds
//! the untyped form editors produce.

mod brancher;
mod dot;
pub mod raw;

use std::fmt;

use crate::morphism::Morphism;
use crate::types::Type;

pub use brancher::{Brancher, Pattern};
pub use raw::{GraphError, RawConnection, RawGraph, RawNode, RawNodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArrowId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for ArrowId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinRef {
    pub node: NodeId,
    pub pin: usize,
}

#[derive(Debug, Clone)]
pub struct OutPin {
    pub brancher: Brancher,
    /// Brancher text as written in the raw graph.
    pub label: String,
    pub arrows: Vec<ArrowId>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub ty: Type,
    pub name: Option<String>,
    pub has_input: bool,
    pub pins: Vec<OutPin>,
    pub incoming: Vec<ArrowId>,
    /// Type produced at the end of this node's exit chain, or a fresh
    /// variable when the node branches, fans out or loops.
    pub return_type: Type,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.incoming.is_empty()
    }

    pub fn is_sink(&self) -> bool {
        self.pins.iter().all(|pin| pin.arrows.is_empty())
    }

    pub fn is_branching(&self) -> bool {
        self.pins.len() > 1
    }

    /// `name :: Type`, or just the type for anonymous nodes.
    pub fn title(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} :: {}", self.ty),
            None => self.ty.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Arrow {
    pub source: PinRef,
    pub target: NodeId,
    pub morphism: Morphism,
    /// Morphism text as written in the raw graph.
    pub text: String,
}

impl Arrow {
    pub fn is_positional(&self) -> bool {
        self.morphism.is_positional()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub(crate) nodes: Vec<Node>,
    pub(crate) arrows: Vec<Arrow>,
}

impl Program {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn arrow(&self, id: ArrowId) -> &Arrow {
        &self.arrows[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn arrow_count(&self) -> usize {
        self.arrows.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn arrows(&self) -> impl Iterator<Item = (ArrowId, &Arrow)> {
        self.arrows
            .iter()
            .enumerate()
            .map(|(index, arrow)| (ArrowId(index), arrow))
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(|(_, node)| node.is_root())
            .map(|(id, _)| id)
    }

    /// Arrows leaving `id`, pin by pin.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = ArrowId> + '_ {
        self.node(id)
            .pins
            .iter()
            .flat_map(|pin| pin.arrows.iter().copied())
    }

    pub fn find_named(&self, name: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.name.as_deref() == Some(name))
            .map(|(id, _)| id)
    }
}
