use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use arbor_core::{
    AgentHandle, Blackboard, BlackboardId, NodeId, NodeStatus, SplitMix64, TickContext, Vec2,
};
use arbor_tools::{StatusEvent, StatusObserver};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arena::NodeArena;
use crate::composite::{Children, Parallel, RandomChoice, Selector, Sequence};
use crate::decorator::Decorator;
use crate::leaf::{ActionBehaviour, ConditionBehaviour, NodeContext};

/// Closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Root,
    Action,
    Condition,
    Repeat,
    Sequence,
    Selector,
    Parallel,
    RandomChoice,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Root => "Root",
            NodeType::Action => "Action",
            NodeType::Condition => "Condition",
            NodeType::Repeat => "Repeat",
            NodeType::Sequence => "Sequence",
            NodeType::Selector => "Selector",
            NodeType::Parallel => "Parallel",
            NodeType::RandomChoice => "RandomChoice",
        }
    }

    pub fn shape(self) -> NodeShape {
        match self {
            NodeType::Action | NodeType::Condition => NodeShape::NoChildren,
            NodeType::Root | NodeType::Repeat => NodeShape::OneChild,
            NodeType::Sequence | NodeType::Selector | NodeType::Parallel | NodeType::RandomChoice => {
                NodeShape::ManyChildren
            }
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many children a node kind takes. Structural edits dispatch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    NoChildren,
    OneChild,
    ManyChildren,
}

/// Behaviour of a node, carrying only the state that behaviour needs.
pub enum NodeKind {
    Root(Decorator),
    Action(Box<dyn ActionBehaviour>),
    Condition(Box<dyn ConditionBehaviour>),
    Repeat(Decorator),
    Sequence(Sequence),
    Selector(Selector),
    Parallel(Parallel),
    RandomChoice(RandomChoice),
}

impl NodeKind {
    pub fn action(behaviour: impl ActionBehaviour) -> Self {
        NodeKind::Action(Box::new(behaviour))
    }

    pub fn condition(behaviour: impl ConditionBehaviour) -> Self {
        NodeKind::Condition(Box::new(behaviour))
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Root(_) => NodeType::Root,
            NodeKind::Action(_) => NodeType::Action,
            NodeKind::Condition(_) => NodeType::Condition,
            NodeKind::Repeat(_) => NodeType::Repeat,
            NodeKind::Sequence(_) => NodeType::Sequence,
            NodeKind::Selector(_) => NodeType::Selector,
            NodeKind::Parallel(_) => NodeType::Parallel,
            NodeKind::RandomChoice(_) => NodeType::RandomChoice,
        }
    }

    pub fn shape(&self) -> NodeShape {
        self.node_type().shape()
    }

    pub(crate) fn decorator(&self) -> Option<&Decorator> {
        match self {
            NodeKind::Root(d) | NodeKind::Repeat(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn decorator_mut(&mut self) -> Option<&mut Decorator> {
        match self {
            NodeKind::Root(d) | NodeKind::Repeat(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn children(&self) -> Option<&Children> {
        match self {
            NodeKind::Sequence(c) => Some(c.children()),
            NodeKind::Selector(c) => Some(c.children()),
            NodeKind::Parallel(c) => Some(c.children()),
            NodeKind::RandomChoice(c) => Some(c.children()),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Children> {
        match self {
            NodeKind::Sequence(c) => Some(c.children_mut()),
            NodeKind::Selector(c) => Some(c.children_mut()),
            NodeKind::Parallel(c) => Some(c.children_mut()),
            NodeKind::RandomChoice(c) => Some(c.children_mut()),
            _ => None,
        }
    }

    /// Child ids in execution order; empty for leaves.
    pub fn child_ids(&self) -> Vec<NodeId> {
        if let Some(d) = self.decorator() {
            return d.child().into_iter().collect();
        }
        self.children()
            .map(|c| c.ids().to_vec())
            .unwrap_or_default()
    }

    /// Authored state only, with child links rewritten through `remap`.
    /// Links with no mapping stay dangling in the copy.
    pub(crate) fn authored_copy(&self, remap: &HashMap<NodeId, NodeId>) -> Self {
        match self {
            NodeKind::Root(d) => NodeKind::Root(d.authored_copy(remap)),
            NodeKind::Repeat(d) => NodeKind::Repeat(d.authored_copy(remap)),
            NodeKind::Action(a) => NodeKind::Action(a.clone_box()),
            NodeKind::Condition(c) => NodeKind::Condition(c.clone_box()),
            NodeKind::Sequence(c) => NodeKind::Sequence(Sequence::new(c.children().authored_copy(remap))),
            NodeKind::Selector(c) => NodeKind::Selector(Selector::new(c.children().authored_copy(remap))),
            NodeKind::Parallel(c) => NodeKind::Parallel(Parallel::new(c.children().authored_copy(remap))),
            NodeKind::RandomChoice(c) => {
                NodeKind::RandomChoice(RandomChoice::new(c.children().authored_copy(remap)))
            }
        }
    }

    fn on_enter(&mut self, leaf: LeafInfo, arena: &NodeArena, scope: &mut TickScope<'_>) {
        match self {
            NodeKind::Action(action) => action.on_enter(&mut scope.leaf_context(leaf)),
            NodeKind::Sequence(c) => c.on_enter(arena),
            NodeKind::Selector(c) => c.on_enter(arena),
            NodeKind::RandomChoice(c) => c.on_enter(scope.rng),
            NodeKind::Root(_) | NodeKind::Repeat(_) | NodeKind::Condition(_) | NodeKind::Parallel(_) => {}
        }
    }

    fn update_internal(
        &mut self,
        leaf: LeafInfo,
        arena: &mut NodeArena,
        scope: &mut TickScope<'_>,
    ) -> NodeStatus {
        match self {
            NodeKind::Root(d) => d.update_root(arena, scope),
            NodeKind::Repeat(d) => d.update_repeat(arena, scope),
            NodeKind::Action(action) => action.update(&mut scope.leaf_context(leaf)),
            NodeKind::Condition(condition) => {
                NodeStatus::from_bool(condition.check(&mut scope.leaf_context(leaf)))
            }
            NodeKind::Sequence(c) => c.update(arena, scope),
            NodeKind::Selector(c) => c.update(arena, scope),
            NodeKind::Parallel(c) => c.update(arena, scope),
            NodeKind::RandomChoice(c) => c.update(arena, scope),
        }
    }

    fn on_exit(&mut self, leaf: LeafInfo, scope: &mut TickScope<'_>) {
        if let NodeKind::Action(action) = self {
            action.on_exit(&mut scope.leaf_context(leaf));
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.node_type().as_str());
        if let Some(d) = self.decorator() {
            s.field("child", &d.child());
        }
        if let Some(c) = self.children() {
            s.field("children", &c.ids());
        }
        s.finish()
    }
}

#[derive(Clone, Copy)]
struct LeafInfo {
    node: NodeId,
    owner: Option<AgentHandle>,
}

/// Everything a tick threads through the recursion besides the arena.
pub(crate) struct TickScope<'a> {
    pub ctx: &'a TickContext,
    pub blackboard: &'a mut Blackboard,
    pub rng: &'a mut SplitMix64,
    pub observers: &'a mut [Box<dyn StatusObserver>],
}

impl TickScope<'_> {
    fn leaf_context(&mut self, leaf: LeafInfo) -> NodeContext<'_> {
        NodeContext {
            tick: self.ctx,
            node: leaf.node,
            owner: leaf.owner,
            blackboard: &mut *self.blackboard,
            rng: &mut *self.rng,
        }
    }
}

/// Update the node `id` through the arena.
///
/// A dangling id resolves to `Fail`: the node was deleted without being
/// detached from its parent, or the links form a cycle.
pub(crate) fn update_node(arena: &mut NodeArena, id: NodeId, scope: &mut TickScope<'_>) -> NodeStatus {
    let Some(mut node) = arena.take(id) else {
        warn!(node = %id, "child reference does not resolve to a live node, treating as Fail");
        return NodeStatus::Fail;
    };
    let status = node.update(arena, scope);
    arena.restore(node);
    status
}

/// One unit of behaviour in a tree.
pub struct Node {
    id: NodeId,
    guid: NodeId,
    type_name: String,
    name: String,
    kind: NodeKind,
    always_check: bool,
    position: Vec2,
    owner: Option<AgentHandle>,
    blackboard: Option<BlackboardId>,
    running: bool,
    observers: Vec<Box<dyn StatusObserver>>,
}

impl Node {
    /// A node whose registry name is its kind name.
    pub fn new(kind: NodeKind) -> Self {
        let type_name = kind.node_type().as_str();
        Self::with_type_name(type_name, kind)
    }

    pub fn with_type_name(type_name: impl Into<String>, kind: NodeKind) -> Self {
        let id = NodeId::new();
        let type_name = type_name.into();
        Self {
            id,
            guid: id,
            name: type_name.clone(),
            type_name,
            kind,
            always_check: false,
            position: Vec2::ZERO,
            owner: None,
            blackboard: None,
            running: false,
            observers: Vec::new(),
        }
    }

    pub(crate) fn with_ids(mut self, id: NodeId, guid: NodeId) -> Self {
        self.id = id;
        self.guid = guid;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Authored identity; survives [`crate::BehaviourTree::instantiate`].
    pub fn guid(&self) -> NodeId {
        self.guid
    }

    /// Registry name this node was created from.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn shape(&self) -> NodeShape {
        self.kind.shape()
    }

    pub fn always_check(&self) -> bool {
        self.always_check
    }

    pub fn set_always_check(&mut self, always_check: bool) {
        self.always_check = always_check;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn owner(&self) -> Option<AgentHandle> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<AgentHandle>) {
        self.owner = owner;
    }

    pub fn blackboard(&self) -> Option<BlackboardId> {
        self.blackboard
    }

    pub(crate) fn set_blackboard(&mut self, blackboard: Option<BlackboardId>) {
        self.blackboard = blackboard;
    }

    /// `true` between an update that returned `Running` and the next update
    /// that returns a terminal status.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn subscribe(&mut self, observer: Box<dyn StatusObserver>) {
        self.observers.push(observer);
    }

    pub fn child_ids(&self) -> Vec<NodeId> {
        self.kind.child_ids()
    }

    /// Copy for a new tree instance: authored state only, runtime state and
    /// observers left behind.
    pub(crate) fn instantiate(
        &self,
        id: NodeId,
        remap: &HashMap<NodeId, NodeId>,
        blackboard: BlackboardId,
    ) -> Self {
        Self {
            id,
            guid: self.guid,
            type_name: self.type_name.clone(),
            name: self.name.clone(),
            kind: self.kind.authored_copy(remap),
            always_check: self.always_check,
            position: self.position,
            owner: None,
            blackboard: Some(blackboard),
            running: false,
            observers: Vec::new(),
        }
    }

    pub(crate) fn update(&mut self, arena: &mut NodeArena, scope: &mut TickScope<'_>) -> NodeStatus {
        let leaf = LeafInfo {
            node: self.id,
            owner: self.owner,
        };

        if !self.running {
            self.kind.on_enter(leaf, arena, scope);
            self.running = true;
        }

        let status = self.kind.update_internal(leaf, arena, scope);

        let event = StatusEvent {
            tick: scope.ctx.tick,
            node: self.id,
            guid: self.guid,
            status,
        };
        notify(&mut self.observers, &event);
        notify(scope.observers, &event);

        if status.is_terminal() {
            self.kind.on_exit(leaf, scope);
            self.running = false;
        }

        status
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("guid", &self.guid)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("always_check", &self.always_check)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

fn notify(observers: &mut [Box<dyn StatusObserver>], event: &StatusEvent) {
    for observer in observers.iter_mut() {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.on_status(event)));
        if delivered.is_err() {
            warn!(node = %event.node, "status observer panicked, continuing tick");
        }
    }
}
