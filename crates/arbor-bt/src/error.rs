use arbor_core::NodeId;
use thiserror::Error;

/// Reasons a tree template cannot be turned into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown node kind `{0}`")]
    UnknownNodeKind(String),

    #[error("node {0} appears more than once")]
    DuplicateNode(NodeId),

    #[error("more than one root node ({0} and {1})")]
    MultipleRoots(NodeId, NodeId),

    #[error("node {parent} references missing child {child}")]
    MissingChild { parent: NodeId, child: NodeId },

    #[error("{kind} node {node} cannot have children")]
    ChildrenOnLeaf { node: NodeId, kind: &'static str },

    #[error("{kind} node {node} takes one child, found {count}")]
    TooManyChildren {
        node: NodeId,
        kind: &'static str,
        count: usize,
    },

    #[error("node {0} is attached to more than one parent")]
    SharedNode(NodeId),

    #[error("node {0} is part of a cycle")]
    Cycle(NodeId),
}
