//! Leaf kinds the CLI registers so templates can be run without a host game.

use std::sync::Arc;

use arbor_bt::{ActionBehaviour, ConditionBehaviour, FnAction, NodeContext, NodeRegistry};
use arbor_core::{DeterministicRng, NodeStatus, TeamBlackboard, Vec3};

/// Blackboard key flipped by `Toggle`.
pub const TOGGLE_KEY: &str = "toggle";

/// Team blackboard key written by `Report`.
pub const SIGHTING_KEY: &str = "sighting";

/// Runs for a fixed number of ticks, then succeeds.
#[derive(Debug, Clone)]
pub struct Wait {
    ticks: u32,
    remaining: u32,
}

impl Wait {
    pub fn new(ticks: u32) -> Self {
        Self {
            ticks,
            remaining: ticks,
        }
    }
}

impl ActionBehaviour for Wait {
    fn on_enter(&mut self, _ctx: &mut NodeContext<'_>) {
        self.remaining = self.ticks;
    }

    fn update(&mut self, _ctx: &mut NodeContext<'_>) -> NodeStatus {
        if self.remaining == 0 {
            return NodeStatus::Success;
        }
        self.remaining -= 1;
        NodeStatus::Running
    }
}

/// Alternates between `true` and `false` on every check, per blackboard.
#[derive(Debug, Clone, Default)]
pub struct Toggle;

impl ConditionBehaviour for Toggle {
    fn check(&mut self, ctx: &mut NodeContext<'_>) -> bool {
        let next = !ctx.blackboard.get::<bool>(TOGGLE_KEY).copied().unwrap_or(false);
        if ctx.blackboard.try_add_or_update_value(TOGGLE_KEY, next).is_err() {
            return false;
        }
        next
    }
}

/// Posts the owner's sighting to the team with a random confidence.
#[derive(Debug, Clone)]
pub struct Report {
    team: Arc<TeamBlackboard>,
}

impl ActionBehaviour for Report {
    fn update(&mut self, ctx: &mut NodeContext<'_>) -> NodeStatus {
        let Some(owner) = ctx.owner else {
            return NodeStatus::Fail;
        };
        let confidence = ctx.rng.next_f32_unit();
        let position = Vec3::new(owner.0 as f32, ctx.tick.tick as f32, 0.0);
        self.team.try_add_or_update_entry(
            SIGHTING_KEY,
            position,
            owner,
            confidence,
            ctx.tick.time_seconds,
        );
        NodeStatus::Success
    }
}

/// Built-in kinds plus `Succeed`, `Fail`, `Wait`, `Toggle` and `Report`.
pub fn registry(team: Arc<TeamBlackboard>) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry
        .register_action(
            "Succeed",
            FnAction::new(|_: &mut NodeContext<'_>| NodeStatus::Success),
        )
        .register_action(
            "Fail",
            FnAction::new(|_: &mut NodeContext<'_>| NodeStatus::Fail),
        )
        .register_action("Wait", Wait::new(3))
        .register_condition("Toggle", Toggle)
        .register_action("Report", Report { team });
    registry
}
