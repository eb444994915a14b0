//! Live node state and the node registry interface.
//!
//! The registry is owned by the host platform. This crate only reads from
//! it, at the moment a selection is resolved, and never caches the answers:
//! a node that was online for the previous build may be gone for this one.

use std::collections::BTreeSet;
use std::sync::RwLock;

use nodeparam_id::NodeName;
use serde::{Deserialize, Serialize};

use crate::label::LabelExpr;

/// A point-in-time view of one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: NodeName,

    /// Whether the node has a live connection.
    #[serde(default = "default_online")]
    pub online: bool,

    /// Whether an operator has marked the node temporarily offline.
    #[serde(default)]
    pub temporarily_offline: bool,

    /// Labels assigned to the node. The node name is an implicit label.
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

fn default_online() -> bool {
    true
}

impl NodeSnapshot {
    /// An online node without labels.
    pub fn online(name: NodeName) -> Self {
        Self {
            name,
            online: true,
            temporarily_offline: false,
            labels: BTreeSet::new(),
        }
    }

    /// Adds labels to the snapshot.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Returns true if the node carries `label`, counting its own name.
    pub fn has_label(&self, label: &str) -> bool {
        self.name == label || self.labels.contains(label)
    }

    /// Returns true if the node is connected and accepting work.
    pub fn is_accepting_work(&self) -> bool {
        self.online && !self.temporarily_offline
    }
}

/// Read access to the host's node registry.
pub trait NodeRegistry: Send + Sync {
    /// All known nodes, including the built-in node when it exists.
    fn list_nodes(&self) -> Vec<NodeSnapshot>;

    /// Current state of a single node.
    fn node(&self, name: &NodeName) -> Option<NodeSnapshot> {
        self.list_nodes().into_iter().find(|n| &n.name == name)
    }

    /// Names of all nodes matching a label expression, in registry order.
    fn nodes_by_label(&self, expr: &LabelExpr) -> Vec<NodeName> {
        self.list_nodes()
            .into_iter()
            .filter(|n| expr.matches(&|label: &str| n.has_label(label)))
            .map(|n| n.name)
            .collect()
    }
}

/// Registry backed by an in-process list of snapshots.
///
/// Used by tests and the `nodeparam-check` tool; state can be updated
/// between resolutions to simulate nodes going offline.
#[derive(Debug, Default)]
pub struct InMemoryNodeRegistry {
    nodes: RwLock<Vec<NodeSnapshot>>,
}

impl InMemoryNodeRegistry {
    /// Create a registry holding the given nodes.
    pub fn new(nodes: Vec<NodeSnapshot>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    /// Add a node, replacing any existing node of the same name.
    pub fn upsert(&self, node: NodeSnapshot) {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        match nodes.iter_mut().find(|n| n.name == node.name) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        }
    }

    /// Remove a node. Returns true if it existed.
    pub fn remove(&self, name: &NodeName) -> bool {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        let before = nodes.len();
        nodes.retain(|n| &n.name != name);
        nodes.len() != before
    }

    /// Update the connection state of a node. Returns false if it is unknown.
    pub fn set_online(&self, name: &NodeName, online: bool) -> bool {
        self.update(name, |n| n.online = online)
    }

    /// Update the temporarily-offline flag of a node. Returns false if it is unknown.
    pub fn set_temporarily_offline(&self, name: &NodeName, temporarily_offline: bool) -> bool {
        self.update(name, |n| n.temporarily_offline = temporarily_offline)
    }

    fn update(&self, name: &NodeName, f: impl FnOnce(&mut NodeSnapshot)) -> bool {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        match nodes.iter_mut().find(|n| &n.name == name) {
            Some(node) => {
                f(node);
                true
            }
            None => false,
        }
    }
}

impl NodeRegistry for InMemoryNodeRegistry {
    fn list_nodes(&self) -> Vec<NodeSnapshot> {
        self.nodes.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
