use std::collections::BTreeMap;
use std::fmt;

use crate::composite::{Children, Parallel, RandomChoice, Selector, Sequence};
use crate::decorator::Decorator;
use crate::leaf::{ActionBehaviour, ConditionBehaviour};
use crate::node::{NodeKind, NodeType};

type Factory = Box<dyn Fn() -> NodeKind + Send + Sync>;

/// Node kinds that can be created by name.
///
/// The built-in control-flow kinds are always present; leaves are registered
/// by the application, each from a prototype that every created node clones.
/// The root is not creatable: a tree has exactly one and makes it itself.
pub struct NodeRegistry {
    factories: BTreeMap<String, Factory>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register(NodeType::Sequence.as_str(), || {
            NodeKind::Sequence(Sequence::new(Children::default()))
        });
        registry.register(NodeType::Selector.as_str(), || {
            NodeKind::Selector(Selector::new(Children::default()))
        });
        registry.register(NodeType::Parallel.as_str(), || {
            NodeKind::Parallel(Parallel::new(Children::default()))
        });
        registry.register(NodeType::RandomChoice.as_str(), || {
            NodeKind::RandomChoice(RandomChoice::new(Children::default()))
        });
        registry.register(NodeType::Repeat.as_str(), || {
            NodeKind::Repeat(Decorator::default())
        });
        registry
    }

    /// Register (or replace) a factory under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> NodeKind + Send + Sync + 'static,
    ) -> &mut Self {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn register_action<B>(&mut self, name: impl Into<String>, prototype: B) -> &mut Self
    where
        B: ActionBehaviour + Clone + Sync,
    {
        self.register(name, move || NodeKind::Action(Box::new(prototype.clone())))
    }

    pub fn register_condition<B>(&mut self, name: impl Into<String>, prototype: B) -> &mut Self
    where
        B: ConditionBehaviour + Clone + Sync,
    {
        self.register(name, move || NodeKind::Condition(Box::new(prototype.clone())))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// `None` when nothing is registered under `name`.
    pub fn create(&self, name: &str) -> Option<NodeKind> {
        self.factories.get(name).map(|factory| factory())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
