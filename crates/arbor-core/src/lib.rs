//! Deterministic, engine-agnostic primitives for the arbor behaviour tree runtime.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod blackboard;
pub mod id;
pub mod math;
pub mod rng;
pub mod status;
pub mod team;
pub mod tick;

pub use agent::{AgentHandle, AgentId};
pub use blackboard::{Blackboard, BlackboardError};
pub use id::{BlackboardId, NodeId};
pub use math::{Vec2, Vec3};
pub use rng::{DeterministicRng, SplitMix64};
pub use status::NodeStatus;
pub use team::{TeamBlackboard, TeamBlackboards, TeamEntry, TeamId};
pub use tick::TickContext;
