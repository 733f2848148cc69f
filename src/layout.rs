//! The editor's persisted JSON document.
//!
//! ```json
//! { "nodes": [ { "id": 0, "position": {"x": 0.0, "y": 0.0},
//!                "text": "fib :: Int", "has_input": false,
//!                "pins": [ { "label": "?< 2",
//!                            "connections": [ {"text": "$", "target": 1} ] } ] } ],
//!   "libraries": ["cmath"], "imports": ["Data.List"] }
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::graph::{GraphError, RawGraph, RawNodeId};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("cannot read layout: {0}")]
    Io(#[from] io::Error),
    #[error("malformed layout: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node id {0} appears twice")]
    DuplicateId(u64),
    #[error("node {node} connects to unknown node {target}")]
    UnknownTarget { node: u64, target: u64 },
    #[error("node {node} has malformed text `{text}`")]
    BadText { node: u64, text: String },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConnection {
    pub text: String,
    pub target: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPin {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub connections: Vec<LayoutConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: u64,
    #[serde(default)]
    pub position: Position,
    /// `name :: Type` or just `Type`.
    pub text: String,
    #[serde(default = "default_has_input")]
    pub has_input: bool,
    #[serde(default)]
    pub pins: Vec<LayoutPin>,
}

fn default_has_input() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

/// A raw graph plus the host libraries and imports it asks for.
#[derive(Debug, Clone, Default)]
pub struct LoadedLayout {
    pub raw: RawGraph,
    pub libraries: Vec<String>,
    pub imports: Vec<String>,
}

impl Layout {
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the raw graph through the raw API. Node ids are editor handles;
    /// raw nodes are created in document order.
    pub fn to_raw(&self) -> Result<LoadedLayout, LayoutError> {
        let mut raw = RawGraph::new();
        let mut handles: HashMap<u64, RawNodeId> = HashMap::new();
        for node in &self.nodes {
            let (name, type_name) = split_text(node)?;
            let labels: Vec<&str> = node.pins.iter().map(|pin| pin.label.as_str()).collect();
            let handle = raw.new_node(type_name, name, &labels, node.has_input);
            if handles.insert(node.id, handle).is_some() {
                return Err(LayoutError::DuplicateId(node.id));
            }
        }

        for node in &self.nodes {
            let source = handles[&node.id];
            for (pin, layout_pin) in node.pins.iter().enumerate() {
                for connection in &layout_pin.connections {
                    let target = handles.get(&connection.target).copied().ok_or(
                        LayoutError::UnknownTarget {
                            node: node.id,
                            target: connection.target,
                        },
                    )?;
                    raw.connect(source, target, pin, connection.text.as_str())?;
                }
            }
        }

        debug!(
            nodes = raw.nodes.len(),
            connections = raw.connections.len(),
            "loaded layout"
        );
        Ok(LoadedLayout {
            raw,
            libraries: self.libraries.clone(),
            imports: self.imports.clone(),
        })
    }
}

fn split_text(node: &LayoutNode) -> Result<(Option<&str>, &str), LayoutError> {
    let bad = || LayoutError::BadText {
        node: node.id,
        text: node.text.clone(),
    };
    match node.text.split_once("::") {
        Some((name, ty)) => {
            let (name, ty) = (name.trim(), ty.trim());
            if name.is_empty() || ty.is_empty() {
                return Err(bad());
            }
            Ok((Some(name), ty))
        }
        None if node.text.trim().is_empty() => Err(bad()),
        None => Ok((None, node.text.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_text() {
        let node = |text: &str| LayoutNode {
            id: 7,
            position: Position::default(),
            text: text.to_string(),
            has_input: true,
            pins: Vec::new(),
        };
        assert_eq!(split_text(&node("fib :: Int")).unwrap(), (Some("fib"), "Int"));
        assert_eq!(split_text(&node(" (Int, Int) ")).unwrap(), (None, "(Int, Int)"));
        assert!(matches!(
            split_text(&node(":: Int")),
            Err(LayoutError::BadText { node: 7, .. })
        ));
    }
}
