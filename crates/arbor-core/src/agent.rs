use core::fmt::Debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identifier for an agent.
///
/// Deterministic simulation requires:
/// - stable ordering (`Ord`)
/// - a stable numeric ID (`stable_id`) for seeding and logs
pub trait AgentId: Copy + Ord + Eq + Debug {
    fn stable_id(self) -> u64;
}

impl AgentId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

/// Opaque handle to the agent that owns a tree instance.
///
/// Nodes only carry the handle; whatever the agent is (a game entity, a
/// physics body) lives outside the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AgentHandle(pub u64);

impl AgentId for AgentHandle {
    fn stable_id(self) -> u64 {
        self.0
    }
}

impl From<u64> for AgentHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
