use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use arbor_core::rng::derive_seed;
use arbor_core::{
    AgentHandle, AgentId, Blackboard, NodeId, NodeStatus, SplitMix64, TickContext, Vec2,
};
use arbor_tools::StatusObserver;
use tracing::debug;

use crate::arena::NodeArena;
use crate::decorator::Decorator;
use crate::node::{update_node, Node, NodeKind, NodeShape, TickScope};
use crate::registry::NodeRegistry;

/// RNG stream reserved for random-choice nodes.
const RANDOM_CHOICE_STREAM: u64 = 0xA7B0_C401_CE00_0001;

/// A root node plus every node authored for it, and one blackboard.
///
/// Structural edits never fail loudly: an edit that does not apply (unknown
/// id, leaf parent, an attach that would share a node or close a cycle) is a
/// no-op that returns `false`.
pub struct BehaviourTree {
    root: NodeId,
    nodes: NodeArena,
    blackboard: Blackboard,
    owner: Option<AgentHandle>,
    registry: Arc<NodeRegistry>,
    seed: u64,
    rng: SplitMix64,
    status: NodeStatus,
    observers: Vec<Box<dyn StatusObserver>>,
}

impl BehaviourTree {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(NodeRegistry::new()))
    }

    pub fn with_registry(registry: Arc<NodeRegistry>) -> Self {
        Self::from_parts(registry, NodeArena::default(), None)
    }

    pub(crate) fn from_parts(
        registry: Arc<NodeRegistry>,
        nodes: NodeArena,
        root: Option<NodeId>,
    ) -> Self {
        let mut tree = Self {
            root: root.unwrap_or_default(),
            nodes,
            blackboard: Blackboard::new(),
            owner: None,
            registry,
            seed: 0,
            rng: SplitMix64::new(0),
            status: NodeStatus::Running,
            observers: Vec::new(),
        };
        tree.ensure_root();
        let blackboard = tree.blackboard.id();
        let ids: Vec<NodeId> = tree.nodes.iter().map(Node::id).collect();
        for id in ids {
            if let Some(node) = tree.nodes.get_mut(id) {
                node.set_blackboard(Some(blackboard));
            }
        }
        tree.reseed();
        tree
    }

    /// Put an empty root in place if the current one is gone.
    fn ensure_root(&mut self) {
        if self.nodes.contains(self.root) {
            return;
        }
        let mut root = Node::new(NodeKind::Root(Decorator::default()));
        root.set_owner(self.owner);
        root.set_blackboard(Some(self.blackboard.id()));
        self.root = self.nodes.insert(root);
    }

    fn reseed(&mut self) {
        let agent = self.owner.map(AgentId::stable_id).unwrap_or(0);
        self.rng = SplitMix64::new(derive_seed(self.seed, agent, RANDOM_CHOICE_STREAM));
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Status returned by the most recent [`tick`](Self::tick); `Running`
    /// before the first one.
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn owner(&self) -> Option<AgentHandle> {
        self.owner
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed for random-choice nodes. The stream actually used also depends on
    /// the owning agent.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.reseed();
    }

    /// Number of nodes in the flat collection, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: a tree always has its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Every node in creation order, including ones not attached to the root.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Create a node of the registered kind `kind`. `None` if the registry
    /// does not know it.
    pub fn create_node(&mut self, kind: &str) -> Option<NodeId> {
        let Some(node_kind) = self.registry.create(kind) else {
            debug!(kind, "cannot create node of unregistered kind");
            return None;
        };
        Some(self.insert(Node::with_type_name(kind, node_kind)))
    }

    /// Add a node built in code (e.g. a closure-backed leaf).
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        self.insert(Node::new(kind))
    }

    fn insert(&mut self, mut node: Node) -> NodeId {
        node.set_owner(self.owner);
        node.set_blackboard(Some(self.blackboard.id()));
        self.nodes.insert(node)
    }

    /// Remove a node from the flat collection.
    ///
    /// Parents are not touched: detach the node with
    /// [`remove_child`](Self::remove_child) first, or the parent keeps a
    /// dangling link that ticks as `Fail`. Deleting the root replaces it with
    /// an empty one.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let removed = self.nodes.remove(id).is_some();
        if removed && id == self.root {
            self.ensure_root();
        }
        removed
    }

    /// Attach `child` under `parent`.
    ///
    /// Single-child parents replace their current child (which stays in the
    /// tree, detached); multi-child parents append. Refused when either node
    /// is unknown, the parent is a leaf, the child is the root or already has
    /// a parent, or the edge would close a cycle.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || !self.nodes.contains(parent) || !self.nodes.contains(child) {
            debug!(%parent, %child, "add_child ignored: unknown node or self link");
            return false;
        }
        if child == self.root || self.parent_of(child).is_some() || self.is_ancestor(child, parent) {
            debug!(%parent, %child, "add_child ignored: node already placed in the tree");
            return false;
        }

        let Some(node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let kind = node.kind_mut();
        match kind.shape() {
            NodeShape::NoChildren => {
                debug!(%parent, "add_child ignored: leaf nodes take no children");
                false
            }
            NodeShape::OneChild => {
                if let Some(slot) = kind.decorator_mut() {
                    slot.set_child(Some(child));
                }
                true
            }
            NodeShape::ManyChildren => {
                if let Some(children) = kind.children_mut() {
                    children.push(child);
                }
                true
            }
        }
    }

    /// Detach `child` from `parent`. Repeating the call is a harmless no-op.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let kind = node.kind_mut();
        if let Some(slot) = kind.decorator_mut() {
            if slot.child() == Some(child) {
                slot.set_child(None);
                return true;
            }
            return false;
        }
        kind.children_mut().is_some_and(|children| children.remove(child))
    }

    /// Snapshot of `parent`'s children in execution order.
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(parent)
            .map(Node::child_ids)
            .unwrap_or_default()
    }

    pub fn parent_of(&self, child: NodeId) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.child_ids().contains(&child))
            .map(Node::id)
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        let mut steps = 0;
        while let Some(parent) = self.parent_of(node) {
            if parent == ancestor {
                return true;
            }
            node = parent;
            steps += 1;
            if steps > self.nodes.len() {
                return true;
            }
        }
        false
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> bool {
        self.nodes.get_mut(id).map(|n| n.set_name(name)).is_some()
    }

    pub fn set_position(&mut self, id: NodeId, position: Vec2) -> bool {
        self.nodes.get_mut(id).map(|n| n.set_position(position)).is_some()
    }

    /// Flag a node to be polled ahead of normal flow by its composite parent.
    /// Takes effect the next time the parent is entered.
    pub fn set_always_check(&mut self, id: NodeId, always_check: bool) -> bool {
        self.nodes
            .get_mut(id)
            .map(|n| n.set_always_check(always_check))
            .is_some()
    }

    /// Order a composite's children left to right by canvas position.
    pub fn sort_children_by_position(&mut self, parent: NodeId) -> bool {
        let xs: HashMap<NodeId, f32> = self
            .children(parent)
            .into_iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id, n.position().x)))
            .collect();
        let Some(children) = self
            .nodes
            .get_mut(parent)
            .and_then(|n| n.kind_mut().children_mut())
        else {
            return false;
        };
        children.sort_by_key(|id| xs.get(&id).copied().unwrap_or(f32::INFINITY));
        true
    }

    /// Observe one node's status after each of its updates.
    pub fn subscribe(&mut self, node: NodeId, observer: impl StatusObserver + 'static) -> bool {
        match self.nodes.get_mut(node) {
            Some(n) => {
                n.subscribe(Box::new(observer));
                true
            }
            None => false,
        }
    }

    /// Observe every node of this tree.
    pub fn subscribe_all(&mut self, observer: impl StatusObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Nodes reachable from the root, depth first, parents before children.
    pub fn reachable(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            stack.extend(node.child_ids().into_iter().rev());
        }
        order
    }

    pub fn traverse(&self, mut visitor: impl FnMut(&Node)) {
        for id in self.reachable() {
            if let Some(node) = self.nodes.get(id) {
                visitor(node);
            }
        }
    }

    /// Hand every reachable node the owning agent and this tree's blackboard,
    /// and reseed random choices for that agent.
    pub fn set_owner(&mut self, agent: AgentHandle) {
        self.owner = Some(agent);
        let blackboard = self.blackboard.id();
        for id in self.reachable() {
            if let Some(node) = self.nodes.get_mut(id) {
                node.set_owner(Some(agent));
                node.set_blackboard(Some(blackboard));
            }
        }
        self.reseed();
    }

    /// Deep copy of everything reachable from the root into an independent
    /// instance: fresh node ids (guids kept), fresh blackboard, no owner, no
    /// observers, and no runtime state.
    pub fn instantiate(&self) -> Self {
        let order = self.reachable();
        let remap: HashMap<NodeId, NodeId> =
            order.iter().map(|&id| (id, NodeId::new())).collect();

        let blackboard = Blackboard::new();
        let mut nodes = NodeArena::default();
        for old in &order {
            if let (Some(node), Some(&new)) = (self.nodes.get(*old), remap.get(old)) {
                nodes.insert(node.instantiate(new, &remap, blackboard.id()));
            }
        }

        let mut tree = Self {
            root: remap.get(&self.root).copied().unwrap_or_default(),
            nodes,
            blackboard,
            owner: None,
            registry: Arc::clone(&self.registry),
            seed: self.seed,
            rng: SplitMix64::new(0),
            status: NodeStatus::Running,
            observers: Vec::new(),
        };
        tree.ensure_root();
        tree.reseed();
        tree
    }

    /// Evaluate the tree once.
    pub fn tick(&mut self, ctx: &TickContext) -> NodeStatus {
        self.ensure_root();
        let mut scope = TickScope {
            ctx,
            blackboard: &mut self.blackboard,
            rng: &mut self.rng,
            observers: self.observers.as_mut_slice(),
        };
        self.status = update_node(&mut self.nodes, self.root, &mut scope);
        self.status
    }
}

impl Default for BehaviourTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BehaviourTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviourTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("owner", &self.owner)
            .field("status", &self.status)
            .field("blackboard", &self.blackboard)
            .finish_non_exhaustive()
    }
}
