use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbor_core::{NodeId, NodeStatus};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Emitted once per node update, after the node produced its status.
///
/// This is intentionally "dumb data" so it can be recorded during simulation
/// and rendered later by tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusEvent {
    pub tick: u64,
    pub node: NodeId,
    /// Authored identity of the node, shared by every clone of a template.
    pub guid: NodeId,
    pub status: NodeStatus,
}

pub trait StatusObserver: Send {
    fn on_status(&mut self, event: &StatusEvent);
}

impl<F> StatusObserver for F
where
    F: FnMut(&StatusEvent) + Send,
{
    fn on_status(&mut self, event: &StatusEvent) {
        self(event)
    }
}

#[derive(Debug, Default)]
pub struct NullObserver;

impl StatusObserver for NullObserver {
    fn on_status(&mut self, _event: &StatusEvent) {}
}

/// Forwards every event to `tracing` at debug level.
#[derive(Debug, Default)]
pub struct LogObserver;

impl StatusObserver for LogObserver {
    fn on_status(&mut self, event: &StatusEvent) {
        debug!(
            tick = event.tick,
            node = %event.node,
            status = ?event.status,
            "node updated"
        );
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<StatusEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: StatusEvent) {
        self.events.push(event);
    }

    pub fn statuses_of(&self, node: NodeId) -> Vec<NodeStatus> {
        self.events
            .iter()
            .filter(|e| e.node == node)
            .map(|e| e.status)
            .collect()
    }
}

/// Collects events into a [`TraceLog`] that stays readable after the observer
/// has been handed to a tree. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    log: Arc<Mutex<TraceLog>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TraceLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> TraceLog {
        self.lock().clone()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.lock().events.clone()
    }

    pub fn take(&self) -> TraceLog {
        std::mem::take(&mut *self.lock())
    }
}

impl StatusObserver for RecordingObserver {
    fn on_status(&mut self, event: &StatusEvent) {
        self.lock().push(*event);
    }
}
