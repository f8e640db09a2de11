//! Behaviour tree execution engine built on `arbor-core`.
//!
//! A [`BehaviourTree`] owns a flat arena of [`Node`]s linked into a tree
//! under one root. An authored tree is a template: [`BehaviourTree::instantiate`]
//! produces an independent runtime copy (fresh node ids, fresh blackboard) per
//! agent, and [`BehaviourTree::tick`] evaluates it once per frame.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod arena;
pub mod agent;
pub mod composite;
pub mod config;
pub mod decorator;
pub mod error;
pub mod leaf;
pub mod node;
pub mod registry;
pub mod template;
pub mod tree;

pub use agent::{tick_agents, BtAgent, ThinkConfig};
pub use composite::{Children, Parallel, RandomChoice, Selector, Sequence};
pub use config::RuntimeConfig;
pub use decorator::Decorator;
pub use error::TreeError;
pub use leaf::{ActionBehaviour, ConditionBehaviour, FnAction, FnCondition, NodeContext};
pub use node::{Node, NodeKind, NodeShape, NodeType};
pub use registry::NodeRegistry;
pub use template::{NodeTemplate, TreeTemplate};
pub use tree::BehaviourTree;

pub use arbor_core::{NodeId, NodeStatus};
