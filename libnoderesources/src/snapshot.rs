use std::collections::HashMap;

use crate::error::{AllocatableError, Result};
use crate::models::NodeInfo;

/// Read access to the node inventory of the current scheduling round.
pub trait NodeInfoLister: Send + Sync {
    fn get(&self, node_name: &str) -> Result<NodeInfo>;
}

/// A point-in-time view of the cluster nodes.
///
/// Taken once at the start of a scheduling round and never mutated
/// afterwards, so it can be read from every scoring task without locking.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    nodes: HashMap<String, NodeInfo>,
}

impl Snapshot {
    pub fn new(nodes: impl IntoIterator<Item = NodeInfo>) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl NodeInfoLister for Snapshot {
    fn get(&self, node_name: &str) -> Result<NodeInfo> {
        self.nodes
            .get(node_name)
            .cloned()
            .ok_or_else(|| AllocatableError::NodeNotFound(node_name.to_string()))
    }
}
