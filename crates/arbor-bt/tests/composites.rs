mod common;

use arbor_bt::{BehaviourTree, FnCondition, NodeContext, NodeKind};
use arbor_core::{AgentHandle, NodeStatus, TickContext};
use arbor_tools::RecordingObserver;
use common::{check, composite, entries, fixed, leaves, new_log, run, Probe};

use NodeStatus::{Fail, Running, Success};

#[test]
fn sequence_advances_one_child_per_tick_and_stops_on_fail() {
    let log = new_log();
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    leaves(
        &mut tree,
        seq,
        vec![
            Probe::new("first", &log, &[Success]).kind(),
            Probe::new("second", &log, &[Success]).kind(),
            Probe::new("third", &log, &[Fail]).kind(),
        ],
    );

    let mut updated_per_tick = Vec::new();
    let mut statuses = Vec::new();
    for tick in 0..3 {
        let before = entries(&log).len();
        statuses.push(tree.tick(&TickContext::new(tick, 0.1)));
        let updated: Vec<String> = entries(&log)[before..]
            .iter()
            .filter_map(|e| e.strip_suffix(":update").map(str::to_string))
            .collect();
        updated_per_tick.push(updated);
    }

    assert_eq!(statuses, vec![Running, Running, Fail]);
    assert_eq!(updated_per_tick, vec![vec!["first"], vec!["second"], vec!["third"]]);
    assert_eq!(tree.status(), Fail);
}

#[test]
fn sequence_of_successes_succeeds_and_restarts() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    leaves(&mut tree, seq, vec![fixed(Success), fixed(Success)]);

    assert_eq!(run(&mut tree, 4), vec![Running, Success, Running, Success]);
}

#[test]
fn selector_tries_children_in_order() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let sel = composite(&mut tree, root, "Selector");
    leaves(&mut tree, sel, vec![fixed(Fail), fixed(Success)]);

    assert_eq!(run(&mut tree, 2), vec![Running, Success]);
}

#[test]
fn selector_fails_when_every_option_fails() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let sel = composite(&mut tree, root, "Selector");
    leaves(&mut tree, sel, vec![fixed(Fail), fixed(Fail)]);

    assert_eq!(run(&mut tree, 2), vec![Running, Fail]);
}

#[test]
fn running_child_keeps_composite_on_it() {
    let log = new_log();
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let sel = composite(&mut tree, root, "Selector");
    leaves(
        &mut tree,
        sel,
        vec![
            Probe::new("slow", &log, &[Running, Running, Success]).kind(),
            Probe::new("never", &log, &[Success]).kind(),
        ],
    );

    assert_eq!(run(&mut tree, 3), vec![Running, Running, Success]);
    assert!(entries(&log).iter().all(|e| e.starts_with("slow")));
}

#[test]
fn parallel_short_circuits_on_first_fail() {
    let log = new_log();
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let par = composite(&mut tree, root, "Parallel");
    leaves(
        &mut tree,
        par,
        vec![
            Probe::new("a", &log, &[Running]).kind(),
            Probe::new("b", &log, &[Fail]).kind(),
            Probe::new("c", &log, &[Success]).kind(),
        ],
    );

    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Fail);
    let log = entries(&log);
    assert!(log.contains(&"a:update".to_string()));
    assert!(log.contains(&"b:update".to_string()));
    assert!(!log.iter().any(|e| e.starts_with("c:")));
}

#[test]
fn parallel_aggregates_running_and_success() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let par = composite(&mut tree, root, "Parallel");
    leaves(&mut tree, par, vec![fixed(Success), fixed(Running)]);
    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Running);

    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let par = composite(&mut tree, root, "Parallel");
    leaves(&mut tree, par, vec![fixed(Success), check(true)]);
    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Success);
}

#[test]
fn failing_guard_aborts_the_branch() {
    let log = new_log();
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    let ids = leaves(
        &mut tree,
        seq,
        vec![check(false), Probe::new("work", &log, &[Success]).kind()],
    );
    tree.set_always_check(ids[0], true);

    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Fail);
    assert!(entries(&log).is_empty());
}

#[test]
fn guard_is_polled_every_tick_while_work_runs() {
    let log = new_log();
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    let guard = FnCondition::new(|ctx: &mut NodeContext<'_>| {
        !ctx.blackboard.get::<bool>("alarm").copied().unwrap_or(false)
    });
    let ids = leaves(
        &mut tree,
        seq,
        vec![
            NodeKind::condition(guard),
            Probe::new("work", &log, &[Running]).kind(),
        ],
    );
    tree.set_always_check(ids[0], true);

    // Guard passes as a normal child, then the work keeps running.
    assert_eq!(run(&mut tree, 3), vec![Running, Running, Running]);
    assert_eq!(entries(&log).len(), 3);

    tree.blackboard_mut().try_add_or_update_value("alarm", true).unwrap();
    assert_eq!(tree.tick(&TickContext::new(3, 0.1)), Fail);
    // Work was not ticked on the aborted frame.
    assert_eq!(
        entries(&log).iter().filter(|e| *e == "work:update").count(),
        2
    );
}

#[test]
fn running_guard_is_treated_as_fail() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let sel = composite(&mut tree, root, "Selector");
    let ids = leaves(&mut tree, sel, vec![fixed(Running), fixed(Success)]);
    tree.set_always_check(ids[0], true);

    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Fail);
}

#[test]
fn always_check_flag_takes_effect_on_next_entry() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let seq = composite(&mut tree, root, "Sequence");
    let ids = leaves(&mut tree, seq, vec![fixed(Success), fixed(Running), check(false)]);

    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Running);
    tree.set_always_check(ids[2], true);
    // Still inside the same run: the new guard is not collected yet.
    assert_eq!(tree.tick(&TickContext::new(1, 0.1)), Running);
}

#[test]
fn empty_composites_fail() {
    for kind in ["Sequence", "Selector", "RandomChoice"] {
        let mut tree = BehaviourTree::new();
        let root = tree.root();
        composite(&mut tree, root, kind);
        assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Fail, "{kind}");
    }
}

#[test]
fn empty_root_and_repeat_fail() {
    let mut tree = BehaviourTree::new();
    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Fail);

    let root = tree.root();
    composite(&mut tree, root, "Repeat");
    assert_eq!(tree.tick(&TickContext::new(1, 0.1)), Fail);
}

#[test]
fn empty_parallel_succeeds() {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    composite(&mut tree, root, "Parallel");
    assert_eq!(tree.tick(&TickContext::new(0, 0.1)), Success);
}

#[test]
fn repeat_hides_child_result() {
    let log = new_log();
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let repeat = composite(&mut tree, root, "Repeat");
    leaves(&mut tree, repeat, vec![Probe::new("child", &log, &[Success, Fail]).kind()]);

    assert_eq!(run(&mut tree, 4), vec![Running; 4]);
    let updates = entries(&log)
        .into_iter()
        .filter(|e| e == "child:update")
        .count();
    assert_eq!(updates, 4);
}

fn random_tree(log: &common::Log) -> BehaviourTree {
    let mut tree = BehaviourTree::new();
    let root = tree.root();
    let choice = composite(&mut tree, root, "RandomChoice");
    leaves(
        &mut tree,
        choice,
        vec![
            Probe::new("a", log, &[Running, Success]).kind(),
            Probe::new("b", log, &[Running, Success]).kind(),
            Probe::new("c", log, &[Running, Success]).kind(),
        ],
    );
    tree
}

fn picks(template: &BehaviourTree, seed: u64, agent: u64, rounds: u64) -> Vec<arbor_core::NodeId> {
    let mut tree = template.instantiate();
    tree.set_seed(seed);
    tree.set_owner(AgentHandle(agent));
    let leaves = tree.children(tree.children(tree.root())[0]);
    let recorder = RecordingObserver::new();
    tree.subscribe_all(recorder.clone());

    run(&mut tree, rounds * 2);
    recorder
        .events()
        .into_iter()
        .filter(|e| leaves.contains(&e.node))
        .map(|e| e.guid)
        .collect()
}

#[test]
fn random_choice_pins_its_pick_until_it_finishes() {
    let template = random_tree(&new_log());
    let guids = picks(&template, 7, 1, 20);

    assert_eq!(guids.len(), 40);
    for pair in guids.chunks(2) {
        assert_eq!(pair[0], pair[1]);
    }
    let distinct: std::collections::HashSet<_> = guids.iter().collect();
    assert!(distinct.len() > 1, "re-entry should re-roll");
}

#[test]
fn random_choice_is_deterministic_per_seed_and_agent() {
    let template = random_tree(&new_log());
    assert_eq!(picks(&template, 7, 1, 20), picks(&template, 7, 1, 20));
    assert_ne!(picks(&template, 7, 1, 20), picks(&template, 7, 2, 20));
}
