#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use arbor_bt::{ActionBehaviour, BehaviourTree, FnAction, FnCondition, NodeContext, NodeKind};
use arbor_core::{NodeId, NodeStatus, TickContext};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn fixed(status: NodeStatus) -> NodeKind {
    NodeKind::action(FnAction::new(move |_ctx: &mut NodeContext<'_>| status))
}

pub fn check(result: bool) -> NodeKind {
    NodeKind::condition(FnCondition::new(move |_ctx: &mut NodeContext<'_>| result))
}

/// Action that logs `name:enter`, `name:update` and `name:exit`, and plays
/// back `script` one status per update, cycling.
#[derive(Clone)]
pub struct Probe {
    name: &'static str,
    log: Log,
    script: Vec<NodeStatus>,
    step: usize,
}

impl Probe {
    pub fn new(name: &'static str, log: &Log, script: &[NodeStatus]) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            script: script.to_vec(),
            step: 0,
        }
    }

    pub fn kind(self) -> NodeKind {
        NodeKind::action(self)
    }

    fn record(&self, what: &str) {
        self.log.lock().unwrap().push(format!("{}:{what}", self.name));
    }
}

impl ActionBehaviour for Probe {
    fn on_enter(&mut self, _ctx: &mut NodeContext<'_>) {
        self.record("enter");
    }

    fn update(&mut self, _ctx: &mut NodeContext<'_>) -> NodeStatus {
        self.record("update");
        let status = self.script[self.step % self.script.len()];
        self.step += 1;
        status
    }

    fn on_exit(&mut self, _ctx: &mut NodeContext<'_>) {
        self.record("exit");
    }
}

/// Create a registered composite/decorator `kind` under `parent`.
pub fn composite(tree: &mut BehaviourTree, parent: NodeId, kind: &str) -> NodeId {
    let id = tree.create_node(kind).unwrap();
    assert!(tree.add_child(parent, id));
    id
}

/// Add each leaf under `parent`, in order.
pub fn leaves(tree: &mut BehaviourTree, parent: NodeId, kinds: Vec<NodeKind>) -> Vec<NodeId> {
    kinds
        .into_iter()
        .map(|kind| {
            let id = tree.add_node(kind);
            assert!(tree.add_child(parent, id));
            id
        })
        .collect()
}

/// Tick `n` frames and collect the tree status of each.
pub fn run(tree: &mut BehaviourTree, n: u64) -> Vec<NodeStatus> {
    (0..n).map(|tick| tree.tick(&TickContext::new(tick, 0.1))).collect()
}
