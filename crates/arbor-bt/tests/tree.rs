mod common;

use arbor_bt::{BehaviourTree, FnAction, NodeContext, NodeKind, NodeType};
use arbor_core::{AgentHandle, NodeStatus, TickContext, Vec2};
use common::{composite, fixed, leaves, run};

use NodeStatus::{Fail, Running, Success};

#[test]
fn new_tree_has_an_empty_root() {
    let tree = BehaviourTree::new();
    assert_eq!(tree.len(), 1);
    assert!(!tree.is_empty());
    assert_eq!(tree.node(tree.root()).unwrap().node_type(), NodeType::Root);
    assert!(tree.children(tree.root()).is_empty());
    assert_eq!(tree.status(), Running);
}

#[test]
fn create_node_needs_a_registered_kind() {
    let mut tree = BehaviourTree::new();
    assert!(tree.create_node("Teleport").is_none());
    assert!(tree.create_node("Root").is_none());

    let seq = tree.create_node("Sequence").unwrap();
    assert_eq!(tree.node(seq).unwrap().type_name(), "Sequence");
    assert_ne!(seq, tree.root());
}

#[test]
fn remove_child_twice_is_harmless() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    let ids = leaves(&mut tree, seq, vec![fixed(Success), fixed(Fail)]);

    assert!(tree.remove_child(seq, ids[0]));
    assert!(!tree.remove_child(seq, ids[0]));
    assert_eq!(tree.children(seq), vec![ids[1]]);
    // Detached, not deleted.
    assert!(tree.contains(ids[0]));
    assert_eq!(tree.parent_of(ids[0]), None);
}

#[test]
fn leaves_take_no_children() {
    let mut tree = BehaviourTree::new();
    let leaf = tree.add_node(fixed(Success));
    let other = tree.add_node(fixed(Success));

    assert!(!tree.add_child(leaf, other));
    assert!(!tree.remove_child(leaf, other));
    assert!(tree.children(leaf).is_empty());
}

#[test]
fn single_child_parent_replaces_its_child() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let repeat = composite(&mut tree, root, "Repeat");
    let first = tree.add_node(fixed(Success));
    let second = tree.add_node(fixed(Fail));

    assert!(tree.add_child(repeat, first));
    assert!(tree.add_child(repeat, second));
    assert_eq!(tree.children(repeat), vec![second]);
    assert_eq!(tree.parent_of(first), None);

    // Removing a child that is not the current one leaves the slot alone.
    assert!(!tree.remove_child(repeat, first));
    assert_eq!(tree.children(repeat), vec![second]);
}

#[test]
fn structure_stays_a_tree() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let outer = tree.create_node("Sequence").unwrap();
    let inner = tree.create_node("Selector").unwrap();
    let other = tree.create_node("Parallel").unwrap();

    assert!(!tree.add_child(outer, outer), "self link");
    assert!(!tree.add_child(outer, root), "root as child");
    assert!(tree.add_child(outer, inner));
    assert!(!tree.add_child(inner, outer), "cycle");
    assert!(!tree.add_child(other, inner), "already parented");
    assert!(!tree.add_child(outer, arbor_core::NodeId::new()), "unknown child");

    assert_eq!(tree.parent_of(inner), Some(outer));
    assert!(tree.children(inner).is_empty());
}

#[test]
fn deleting_an_attached_node_leaves_a_failing_link() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    let ids = leaves(&mut tree, seq, vec![fixed(Success)]);

    assert!(tree.delete_node(ids[0]));
    assert!(!tree.delete_node(ids[0]));
    assert_eq!(tree.children(seq), ids);
    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Fail);
}

#[test]
fn instances_keep_dangling_links_of_the_template() {
    let mut template = BehaviourTree::new();
    let root = template.root();
    let seq = composite(&mut template, root, "Sequence");
    let ids = leaves(&mut template, seq, vec![fixed(Success), fixed(Success)]);
    assert!(template.delete_node(ids[1]));

    let mut instance = template.instantiate();
    let instance_seq = instance.children(instance.root())[0];
    let instance_children = instance.children(instance_seq);
    assert_eq!(instance_children.len(), template.children(seq).len());
    assert!(!instance.contains(instance_children[1]));
    assert!(!template.contains(instance_children[1]));

    assert_eq!(run(&mut template, 2), vec![Running, Fail]);
    assert_eq!(run(&mut instance, 2), vec![Running, Fail]);
}

#[test]
fn deleting_the_root_recreates_an_empty_one() {
    let mut tree = BehaviourTree::new();
    let old_root = tree.root();
    composite(&mut tree, old_root, "Sequence");

    assert!(tree.delete_node(old_root));
    assert_ne!(tree.root(), old_root);
    assert!(!tree.contains(old_root));
    assert!(tree.children(tree.root()).is_empty());
    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Fail);
}

#[test]
fn instances_share_guids_but_nothing_else() {
    let mut template = BehaviourTree::new();
    let root = template.root();
    let seq = composite(&mut template, root, "Sequence");
    leaves(&mut template, seq, vec![fixed(Success), fixed(Success)]);
    let detached = template.add_node(fixed(Fail));

    let mut a = template.instantiate();
    let b = template.instantiate();

    assert_eq!(a.len(), 4);
    assert!(a.nodes().all(|n| n.guid() != detached));
    let guids = |t: &BehaviourTree| t.nodes().map(|n| n.guid()).collect::<Vec<_>>();
    let ids = |t: &BehaviourTree| t.nodes().map(|n| n.id()).collect::<Vec<_>>();
    assert_eq!(guids(&a), guids(&b));
    assert!(ids(&a).iter().all(|id| !ids(&b).contains(id)));
    assert!(ids(&a).iter().all(|id| !template.contains(*id)));
    assert_ne!(a.blackboard().id(), b.blackboard().id());
    assert_ne!(a.blackboard().id(), template.blackboard().id());

    let kinds = |t: &BehaviourTree| t.nodes().map(|n| n.node_type()).collect::<Vec<_>>();
    assert_eq!(kinds(&a), kinds(&b));

    // Runtime state does not leak between instances.
    a.blackboard_mut().try_add_or_update_value("k", 1u8).unwrap();
    assert_eq!(a.tick(&TickContext::new(0, 0.1)), Running);
    assert!(b.nodes().all(|n| !n.is_running()));
    assert!(!b.blackboard().contains_value("k"));
    assert!(template.nodes().all(|n| !n.is_running()));

    let mut c = a.instantiate();
    assert_eq!(run(&mut c, 2), vec![Running, Success]);
}

#[test]
fn set_owner_reaches_every_attached_node() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    let whoami = FnAction::new(|ctx: &mut NodeContext<'_>| {
        let owner = ctx.owner.map(|a| a.0).unwrap_or(0);
        ctx.blackboard.try_add_or_update_value("owner", owner).unwrap();
        NodeStatus::Success
    });
    leaves(&mut tree, seq, vec![NodeKind::action(whoami)]);
    let detached = tree.add_node(fixed(Success));

    tree.set_owner(AgentHandle(42));

    let blackboard = tree.blackboard().id();
    for id in tree.reachable() {
        let node = tree.node(id).unwrap();
        assert_eq!(node.owner(), Some(AgentHandle(42)));
        assert_eq!(node.blackboard(), Some(blackboard));
    }
    assert_eq!(tree.node(detached).unwrap().owner(), None);

    tree.tick(&TickContext::new(0, 0.1));
    assert_eq!(tree.blackboard().get::<u64>("owner"), Some(&42));
}

#[test]
fn children_sort_left_to_right() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let sel = composite(&mut tree, root, "Selector");
    let ids = leaves(&mut tree, sel, vec![fixed(Fail), fixed(Fail), fixed(Success)]);
    tree.set_position(ids[0], Vec2::new(30.0, 0.0));
    tree.set_position(ids[1], Vec2::new(10.0, 5.0));
    tree.set_position(ids[2], Vec2::new(20.0, -5.0));

    assert!(tree.sort_children_by_position(sel));
    assert_eq!(tree.children(sel), vec![ids[1], ids[2], ids[0]]);
    assert!(!tree.sort_children_by_position(ids[0]));
}

#[test]
fn traverse_visits_parents_before_children() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    let ids = leaves(&mut tree, seq, vec![fixed(Success), fixed(Success)]);
    tree.set_name(ids[1], "last");

    let mut names = Vec::new();
    tree.traverse(|n| names.push(n.name().to_string()));
    assert_eq!(names, vec!["Root", "Sequence", "Action", "last"]);
}
