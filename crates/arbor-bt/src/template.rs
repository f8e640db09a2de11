//! Serializable tree definitions.
//!
//! A template is the flat node list with child links by guid, the same shape
//! an editor saves. Loading it validates the links; ticking happens on
//! instances made from the loaded tree.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arbor_core::{NodeId, Vec2};
use serde::{Deserialize, Serialize};

use crate::arena::NodeArena;
use crate::decorator::Decorator;
use crate::error::TreeError;
use crate::node::{Node, NodeKind, NodeShape, NodeType};
use crate::registry::NodeRegistry;
use crate::tree::BehaviourTree;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub guid: NodeId,

    /// Registry name, or `Root` for the tree root.
    pub kind: String,

    /// Display name; defaults to `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub always_check: bool,

    #[serde(default)]
    pub position: Vec2,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeTemplate {
    #[serde(default)]
    pub nodes: Vec<NodeTemplate>,
}

impl TreeTemplate {
    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tree template from {}", path.display()))?;
        let template = if is_json(path) {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse tree template from {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse tree template from {}", path.display()))?
        };
        Ok(template)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write tree template to {}", path.display()))?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl BehaviourTree {
    /// Build an authored tree from a template. Node ids equal the template
    /// guids. A template without a root gets an empty one.
    pub fn from_template(
        template: &TreeTemplate,
        registry: Arc<NodeRegistry>,
    ) -> Result<Self, TreeError> {
        let mut seen = HashSet::new();
        let mut root = None;
        for node in &template.nodes {
            if !seen.insert(node.guid) {
                return Err(TreeError::DuplicateNode(node.guid));
            }
            if node.kind == NodeType::Root.as_str() {
                if let Some(first) = root {
                    return Err(TreeError::MultipleRoots(first, node.guid));
                }
                root = Some(node.guid);
            }
        }

        let mut parents: HashMap<NodeId, NodeId> = HashMap::new();
        let mut arena = NodeArena::default();
        for authored in &template.nodes {
            let mut kind = if authored.kind == NodeType::Root.as_str() {
                NodeKind::Root(Decorator::default())
            } else {
                registry
                    .create(&authored.kind)
                    .ok_or_else(|| TreeError::UnknownNodeKind(authored.kind.clone()))?
            };

            link_children(authored, &mut kind, &seen, root)?;
            for &child in &authored.children {
                if parents.insert(child, authored.guid).is_some() {
                    return Err(TreeError::SharedNode(child));
                }
            }

            let mut node = Node::with_type_name(authored.kind.clone(), kind).with_ids(authored.guid, authored.guid);
            if let Some(name) = &authored.name {
                node.set_name(name.clone());
            }
            node.set_always_check(authored.always_check);
            node.set_position(authored.position);
            arena.insert(node);
        }

        // One parent per node and a parentless root leave only detached
        // loops to rule out.
        for &start in parents.keys() {
            let mut current = start;
            for _ in 0..=parents.len() {
                match parents.get(&current) {
                    Some(&parent) if parent == start => return Err(TreeError::Cycle(start)),
                    Some(&parent) => current = parent,
                    None => break,
                }
            }
        }

        Ok(BehaviourTree::from_parts(registry, arena, root))
    }

    /// Write the flat node list back out, links expressed by guid.
    pub fn to_template(&self) -> TreeTemplate {
        let guids: HashMap<NodeId, NodeId> = self.nodes().map(|n| (n.id(), n.guid())).collect();
        let nodes = self
            .nodes()
            .map(|node| NodeTemplate {
                guid: node.guid(),
                kind: if node.node_type() == NodeType::Root {
                    NodeType::Root.as_str().to_string()
                } else {
                    node.type_name().to_string()
                },
                name: (node.name() != node.type_name()).then(|| node.name().to_string()),
                always_check: node.always_check(),
                position: node.position(),
                children: node
                    .child_ids()
                    .iter()
                    .filter_map(|id| guids.get(id).copied())
                    .collect(),
            })
            .collect();
        TreeTemplate { nodes }
    }
}

fn link_children(
    authored: &NodeTemplate,
    kind: &mut NodeKind,
    known: &HashSet<NodeId>,
    root: Option<NodeId>,
) -> Result<(), TreeError> {
    for &child in &authored.children {
        if !known.contains(&child) {
            return Err(TreeError::MissingChild {
                parent: authored.guid,
                child,
            });
        }
        if Some(child) == root || child == authored.guid {
            return Err(TreeError::Cycle(child));
        }
    }

    let kind_name = kind.node_type().as_str();
    match kind.shape() {
        NodeShape::NoChildren if !authored.children.is_empty() => Err(TreeError::ChildrenOnLeaf {
            node: authored.guid,
            kind: kind_name,
        }),
        NodeShape::NoChildren => Ok(()),
        NodeShape::OneChild if authored.children.len() > 1 => Err(TreeError::TooManyChildren {
            node: authored.guid,
            kind: kind_name,
            count: authored.children.len(),
        }),
        NodeShape::OneChild => {
            if let Some(slot) = kind.decorator_mut() {
                slot.set_child(authored.children.first().copied());
            }
            Ok(())
        }
        NodeShape::ManyChildren => {
            if let Some(children) = kind.children_mut() {
                for &child in &authored.children {
                    children.push(child);
                }
            }
            Ok(())
        }
    }
}
