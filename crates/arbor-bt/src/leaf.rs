//! Leaf behaviours: the domain logic at the bottom of a tree.

use arbor_core::{AgentHandle, Blackboard, NodeId, NodeStatus, SplitMix64, TickContext};

/// What a leaf can see while it runs.
pub struct NodeContext<'a> {
    pub tick: &'a TickContext,
    pub node: NodeId,
    pub owner: Option<AgentHandle>,
    pub blackboard: &'a mut Blackboard,
    pub rng: &'a mut SplitMix64,
}

/// Terminal behaviour returning `Success`, `Fail` or `Running` directly.
///
/// `update` must not block: long work is modelled by returning `Running` and
/// picking up again on the next tick. `on_enter` runs before the first update
/// after the node was idle, `on_exit` after an update that returned a
/// terminal status.
pub trait ActionBehaviour: CloneAction + Send + 'static {
    fn on_enter(&mut self, _ctx: &mut NodeContext<'_>) {}

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> NodeStatus;

    fn on_exit(&mut self, _ctx: &mut NodeContext<'_>) {}
}

/// A boolean test. `true` maps to `Success`, `false` to `Fail`; never `Running`.
pub trait ConditionBehaviour: CloneCondition + Send + 'static {
    fn check(&mut self, ctx: &mut NodeContext<'_>) -> bool;
}

/// Object-safe cloning for boxed actions; implemented for every `Clone` action.
pub trait CloneAction {
    fn clone_box(&self) -> Box<dyn ActionBehaviour>;
}

impl<T> CloneAction for T
where
    T: ActionBehaviour + Clone,
{
    fn clone_box(&self) -> Box<dyn ActionBehaviour> {
        Box::new(self.clone())
    }
}

pub trait CloneCondition {
    fn clone_box(&self) -> Box<dyn ConditionBehaviour>;
}

impl<T> CloneCondition for T
where
    T: ConditionBehaviour + Clone,
{
    fn clone_box(&self) -> Box<dyn ConditionBehaviour> {
        Box::new(self.clone())
    }
}

/// Action backed by a closure. Clones of the tree clone the closure, so any
/// captured state is per instance.
#[derive(Clone)]
pub struct FnAction<F> {
    update: F,
}

impl<F> FnAction<F>
where
    F: FnMut(&mut NodeContext<'_>) -> NodeStatus,
{
    pub fn new(update: F) -> Self {
        Self { update }
    }
}

impl<F> ActionBehaviour for FnAction<F>
where
    F: FnMut(&mut NodeContext<'_>) -> NodeStatus + Clone + Send + 'static,
{
    fn update(&mut self, ctx: &mut NodeContext<'_>) -> NodeStatus {
        (self.update)(ctx)
    }
}

#[derive(Clone)]
pub struct FnCondition<F> {
    check: F,
}

impl<F> FnCondition<F>
where
    F: FnMut(&mut NodeContext<'_>) -> bool,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> ConditionBehaviour for FnCondition<F>
where
    F: FnMut(&mut NodeContext<'_>) -> bool + Clone + Send + 'static,
{
    fn check(&mut self, ctx: &mut NodeContext<'_>) -> bool {
        (self.check)(ctx)
    }
}
