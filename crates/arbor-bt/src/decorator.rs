//! Single-child nodes: the tree root and the repeat decorator.

use std::collections::HashMap;

use arbor_core::{NodeId, NodeStatus};
use tracing::warn;

use crate::arena::NodeArena;
use crate::composite::relink;
use crate::node::{update_node, TickScope};

/// Slot for at most one child.
#[derive(Debug, Default, Clone)]
pub struct Decorator {
    child: Option<NodeId>,
}

impl Decorator {
    pub fn new(child: Option<NodeId>) -> Self {
        Self { child }
    }

    pub fn child(&self) -> Option<NodeId> {
        self.child
    }

    /// Replace the child, returning the previous one.
    pub(crate) fn set_child(&mut self, child: Option<NodeId>) -> Option<NodeId> {
        std::mem::replace(&mut self.child, child)
    }

    pub(crate) fn authored_copy(&self, remap: &HashMap<NodeId, NodeId>) -> Self {
        Self::new(self.child.map(|id| relink(remap, id)))
    }

    /// Root: report the child's status as the tree's.
    pub(crate) fn update_root(&mut self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        match self.child {
            Some(child) => update_node(arena, child, scope),
            None => {
                warn!("root has no child, treating as Fail");
                NodeStatus::Fail
            }
        }
    }

    /// Repeat: tick the child once, discard its result, stay `Running`.
    ///
    /// The child's outcome never reaches the parent; only an enclosing
    /// composite (or dropping the tree) ends a repeat.
    pub(crate) fn update_repeat(&mut self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        match self.child {
            Some(child) => {
                let _ = update_node(arena, child, scope);
                NodeStatus::Running
            }
            None => {
                warn!("repeat has no child, treating as Fail");
                NodeStatus::Fail
            }
        }
    }
}
