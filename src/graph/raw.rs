//! Untyped program graph as produced by editors: free-text type names,
//! brancher strings and morphism strings, checked only for shape.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawNodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(usize),
    #[error("node {0} takes no input")]
    NoInput(usize),
    #[error("node {node} has {pins} output pin(s), pin {pin} requested")]
    PinOutOfRange { node: usize, pin: usize, pins: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub type_name: String,
    pub name: Option<String>,
    /// One brancher string per output pin.
    pub branchers: Vec<String>,
    pub has_input: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConnection {
    pub source: RawNodeId,
    pub target: RawNodeId,
    pub pin: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub connections: Vec<RawConnection>,
}

impl RawGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_node(
        &mut self,
        type_name: impl Into<String>,
        name: Option<&str>,
        branchers: &[&str],
        has_input: bool,
    ) -> RawNodeId {
        self.nodes.push(RawNode {
            type_name: type_name.into(),
            name: name.map(str::to_string),
            branchers: branchers.iter().map(|b| b.to_string()).collect(),
            has_input,
        });
        RawNodeId(self.nodes.len() - 1)
    }

    pub fn connect(
        &mut self,
        source: RawNodeId,
        target: RawNodeId,
        pin: usize,
        text: impl Into<String>,
    ) -> Result<(), GraphError> {
        let from = self
            .nodes
            .get(source.0)
            .ok_or(GraphError::UnknownNode(source.0))?;
        if pin >= from.branchers.len() {
            return Err(GraphError::PinOutOfRange {
                node: source.0,
                pin,
                pins: from.branchers.len(),
            });
        }
        let to = self
            .nodes
            .get(target.0)
            .ok_or(GraphError::UnknownNode(target.0))?;
        if !to.has_input {
            return Err(GraphError::NoInput(target.0));
        }
        self.connections.push(RawConnection {
            source,
            target,
            pin,
            text: text.into(),
        });
        Ok(())
    }

    /// Connections leaving `node`, in insertion order.
    pub fn outgoing(&self, node: RawNodeId) -> impl Iterator<Item = &RawConnection> {
        self.connections.iter().filter(move |c| c.source == node)
    }
}
