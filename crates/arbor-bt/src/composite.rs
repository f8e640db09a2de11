//! Multi-child control flow: sequence, selector, parallel and random choice.

use std::collections::HashMap;

use arbor_core::{DeterministicRng, NodeId, NodeStatus, SplitMix64};
use tracing::warn;

use crate::arena::NodeArena;
use crate::node::{update_node, TickScope};

/// Ordered children of a composite plus the runtime subset flagged
/// always-check.
///
/// List order is execution priority. The always-check subset is rebuilt on
/// entry by scanning the children's flags; it only grows, so a child removed
/// while the composite keeps its runtime state is still polled.
#[derive(Debug, Default, Clone)]
pub struct Children {
    list: Vec<NodeId>,
    always_check: Vec<NodeId>,
}

impl Children {
    pub fn new(list: Vec<NodeId>) -> Self {
        Self {
            list,
            always_check: Vec::new(),
        }
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.list
    }

    pub fn always_check_ids(&self) -> &[NodeId] {
        &self.always_check
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub(crate) fn push(&mut self, child: NodeId) {
        self.list.push(child);
    }

    pub(crate) fn remove(&mut self, child: NodeId) -> bool {
        match self.list.iter().position(|id| *id == child) {
            Some(index) => {
                self.list.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn sort_by_key<K: PartialOrd>(&mut self, mut key: impl FnMut(NodeId) -> K) {
        self.list
            .sort_by(|a, b| key(*a).partial_cmp(&key(*b)).unwrap_or(std::cmp::Ordering::Equal));
    }

    /// Links to deleted nodes get a fresh id that never resolves, so the copy
    /// keeps the child count and still ticks them as `Fail`.
    pub(crate) fn authored_copy(&self, remap: &HashMap<NodeId, NodeId>) -> Self {
        Self::new(self.list.iter().map(|id| relink(remap, *id)).collect())
    }

    fn collect_always_check(&mut self, arena: &NodeArena) {
        for &child in &self.list {
            let flagged = arena.get(child).is_some_and(|n| n.always_check());
            if flagged && !self.always_check.contains(&child) {
                self.always_check.push(child);
            }
        }
    }

    /// Poll every always-check child. Any `Fail` fails the whole check; a
    /// `Running` is a misconfigured guard and also fails it.
    fn check_always_check(&self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        for &guard in &self.always_check {
            match update_node(arena, guard, scope) {
                NodeStatus::Success => {}
                NodeStatus::Fail => return NodeStatus::Fail,
                NodeStatus::Running => {
                    warn!(
                        node = %guard,
                        "always-check node returned Running; guards must resolve within one tick, treating as Fail"
                    );
                    return NodeStatus::Fail;
                }
            }
        }
        NodeStatus::Success
    }
}

pub(crate) fn relink(remap: &HashMap<NodeId, NodeId>, id: NodeId) -> NodeId {
    remap.get(&id).copied().unwrap_or_else(NodeId::new)
}

/// "AND": run children in order, fail on the first failure.
#[derive(Debug, Default, Clone)]
pub struct Sequence {
    children: Children,
    current: usize,
}

impl Sequence {
    pub fn new(children: Children) -> Self {
        Self {
            children,
            current: 0,
        }
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub(crate) fn on_enter(&mut self, arena: &NodeArena) {
        self.current = 0;
        self.children.collect_always_check(arena);
    }

    pub(crate) fn update(&mut self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        if self.children.is_empty() {
            warn!("sequence has no children, treating as Fail");
            return NodeStatus::Fail;
        }
        if self.children.check_always_check(arena, scope) == NodeStatus::Fail {
            return NodeStatus::Fail;
        }
        let Some(&child) = self.children.list.get(self.current) else {
            return NodeStatus::Fail;
        };

        match update_node(arena, child, scope) {
            NodeStatus::Running => NodeStatus::Running,
            NodeStatus::Fail => NodeStatus::Fail,
            NodeStatus::Success => {
                self.current += 1;
                if self.current < self.children.len() {
                    NodeStatus::Running
                } else {
                    NodeStatus::Success
                }
            }
        }
    }
}

/// "OR": try children in order, one per tick, until one succeeds.
#[derive(Debug, Default, Clone)]
pub struct Selector {
    children: Children,
    current: usize,
}

impl Selector {
    pub fn new(children: Children) -> Self {
        Self {
            children,
            current: 0,
        }
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub(crate) fn on_enter(&mut self, arena: &NodeArena) {
        self.current = 0;
        self.children.collect_always_check(arena);
    }

    pub(crate) fn update(&mut self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        if self.children.is_empty() {
            warn!("selector has no children, treating as Fail");
            return NodeStatus::Fail;
        }
        if self.children.check_always_check(arena, scope) == NodeStatus::Fail {
            return NodeStatus::Fail;
        }
        let Some(&child) = self.children.list.get(self.current) else {
            return NodeStatus::Fail;
        };

        match update_node(arena, child, scope) {
            NodeStatus::Running => NodeStatus::Running,
            NodeStatus::Success => NodeStatus::Success,
            NodeStatus::Fail => {
                self.current += 1;
                if self.current < self.children.len() {
                    NodeStatus::Running
                } else {
                    NodeStatus::Fail
                }
            }
        }
    }
}

/// Ticks every child each tick. The first `Fail` in list order ends the scan;
/// with no children there is nothing to fail and the result is `Success`.
#[derive(Debug, Default, Clone)]
pub struct Parallel {
    children: Children,
}

impl Parallel {
    pub fn new(children: Children) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    pub(crate) fn update(&mut self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        let mut result = NodeStatus::Success;
        for &child in &self.children.list {
            match update_node(arena, child, scope) {
                NodeStatus::Success => {}
                NodeStatus::Running => result = NodeStatus::Running,
                NodeStatus::Fail => return NodeStatus::Fail,
            }
        }
        result
    }
}

/// Picks one child uniformly at random on entry and follows it until it
/// finishes.
#[derive(Debug, Default, Clone)]
pub struct RandomChoice {
    children: Children,
    selected: Option<NodeId>,
}

impl RandomChoice {
    pub fn new(children: Children) -> Self {
        Self {
            children,
            selected: None,
        }
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Children {
        &mut self.children
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub(crate) fn on_enter(&mut self, rng: &mut SplitMix64) {
        self.selected = if self.children.is_empty() {
            warn!("random choice has no children, treating as Fail");
            None
        } else {
            let index = rng.next_index(self.children.len());
            Some(self.children.list[index])
        };
    }

    pub(crate) fn update(&mut self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        match self.selected {
            Some(child) => update_node(arena, child, scope),
            None => NodeStatus::Fail,
        }
    }
}
