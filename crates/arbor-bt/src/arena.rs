use std::collections::HashMap;

use arbor_core::NodeId;

use crate::node::Node;

/// Flat node storage of one tree, in creation order.
///
/// A node being updated is taken out of the arena for the duration of its
/// update and put back afterwards, which lets it tick its children through
/// the same arena. A child id that does not resolve (deleted, or an ancestor
/// currently being updated) is reported as missing.
#[derive(Default)]
pub(crate) struct NodeArena {
    order: Vec<NodeId>,
    nodes: HashMap<NodeId, Node>,
}

impl NodeArena {
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = node.id();
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        self.order.retain(|n| *n != id);
        Some(node)
    }

    pub fn take(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub fn restore(&mut self, node: Node) {
        self.nodes.insert(node.id(), node);
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }
}
