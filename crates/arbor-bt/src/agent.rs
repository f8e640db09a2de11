use arbor_core::{AgentHandle, AgentId, NodeStatus, TickContext};

use crate::config::RuntimeConfig;
use crate::tree::BehaviourTree;

/// How often an agent's tree is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThinkConfig {
    pub think_every_ticks: u32,
    pub think_offset_ticks: u32,
}

impl Default for ThinkConfig {
    fn default() -> Self {
        Self {
            think_every_ticks: 1,
            think_offset_ticks: 0,
        }
    }
}

impl ThinkConfig {
    /// Spread agents over the frames of each period by their stable id.
    pub fn deterministic(agent: impl AgentId, think_every_ticks: u32) -> Self {
        let every = think_every_ticks.max(1);
        let offset = (agent.stable_id() % (every as u64)) as u32;
        Self {
            think_every_ticks: every,
            think_offset_ticks: offset,
        }
    }

    pub fn should_think(&self, tick: u64) -> bool {
        let every = self.think_every_ticks.max(1) as u64;
        ((tick + (self.think_offset_ticks as u64)) % every) == 0
    }
}

/// Runtime glue between one agent and its own instance of a tree template.
pub struct BtAgent {
    handle: AgentHandle,
    pub config: ThinkConfig,
    tree: Option<BehaviourTree>,
    enabled: bool,
    last_status: Option<NodeStatus>,
}

impl BtAgent {
    /// Instantiate `template` for `handle` and take ownership of the copy.
    pub fn new(handle: AgentHandle, template: &BehaviourTree) -> Self {
        let mut tree = template.instantiate();
        tree.set_owner(handle);
        Self::with_tree(handle, Some(tree))
    }

    /// Like [`BtAgent::new`], with seed and thinking rate from `config`.
    pub fn from_config(handle: AgentHandle, template: &BehaviourTree, config: &RuntimeConfig) -> Self {
        let mut tree = template.instantiate();
        tree.set_seed(config.seed);
        tree.set_owner(handle);
        let mut agent = Self::with_tree(handle, Some(tree));
        agent.config = ThinkConfig::deterministic(handle, config.think_every_ticks);
        agent
    }

    /// An agent with nothing to run; ticking it does nothing.
    pub fn without_tree(handle: AgentHandle) -> Self {
        Self::with_tree(handle, None)
    }

    fn with_tree(handle: AgentHandle, tree: Option<BehaviourTree>) -> Self {
        Self {
            handle,
            config: ThinkConfig::default(),
            tree,
            enabled: true,
            last_status: None,
        }
    }

    pub fn handle(&self) -> AgentHandle {
        self.handle
    }

    pub fn tree(&self) -> Option<&BehaviourTree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut BehaviourTree> {
        self.tree.as_mut()
    }

    pub fn last_status(&self) -> Option<NodeStatus> {
        self.last_status
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stop ticking. The tree keeps its state and resumes on `enable`.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Tick the tree if the agent is enabled and due to think this frame.
    pub fn tick(&mut self, ctx: &TickContext) -> Option<NodeStatus> {
        if !self.enabled || !self.config.should_think(ctx.tick) {
            return None;
        }
        let status = self.tree.as_mut()?.tick(ctx);
        self.last_status = Some(status);
        Some(status)
    }
}

/// Tick every agent once, in stable id order.
pub fn tick_agents(ctx: &TickContext, agents: &mut [BtAgent]) {
    agents.sort_by_key(|a| a.handle.stable_id());
    for agent in agents.iter_mut() {
        agent.tick(ctx);
    }
}
