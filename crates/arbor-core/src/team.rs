//! Team-wide fact store shared by several agents.
//!
//! Agents post observations (a position, usually) together with how confident
//! they are. A write only lands when it is strictly more confident than what
//! is stored, or equally confident and newer. The compare and the write happen
//! under one lock, so concurrent writers cannot interleave between them.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::{AgentHandle, Vec3};

pub type TeamId = u32;

/// Confidence used by callers that have no better estimate.
pub const DEFAULT_CONFIDENCE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TeamEntry {
    pub key: String,
    pub value: Vec3,
    pub last_update_agent: AgentHandle,
    /// Simulation time of the last accepted write, in seconds.
    pub last_update_time: f64,
    pub confidence: f32,
}

impl TeamEntry {
    pub fn age(&self, now: f64) -> f64 {
        now - self.last_update_time
    }

    fn accepts(&self, confidence: f32, now: f64) -> bool {
        confidence > self.confidence
            || (confidence == self.confidence && self.last_update_time < now)
    }
}

#[derive(Debug, Default)]
pub struct TeamBlackboard {
    entries: Mutex<BTreeMap<String, TeamEntry>>,
}

impl TeamBlackboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, TeamEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` when the write was stored.
    pub fn try_add_or_update_entry(
        &self,
        key: &str,
        value: Vec3,
        agent: AgentHandle,
        confidence: f32,
        now: f64,
    ) -> bool {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(key) {
            if !existing.accepts(confidence, now) {
                trace!(
                    key,
                    confidence,
                    stored = existing.confidence,
                    "team blackboard write rejected"
                );
                return false;
            }
        }

        entries.insert(
            key.to_string(),
            TeamEntry {
                key: key.to_string(),
                value,
                last_update_agent: agent,
                last_update_time: now,
                confidence,
            },
        );
        true
    }

    pub fn get_entry(&self, key: &str) -> Option<TeamEntry> {
        self.lock().get(key).cloned()
    }

    /// Entry for `key` if it is younger than `max_age` seconds at time `now`.
    pub fn try_get_entry(&self, key: &str, max_age: f64, now: f64) -> Option<TeamEntry> {
        self.lock()
            .get(key)
            .filter(|entry| entry.age(now) < max_age)
            .cloned()
    }

    /// Snapshot of every entry, ordered by key.
    pub fn entries(&self) -> Vec<TeamEntry> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }
}

/// Process-scoped registry of team blackboards.
///
/// Hand a clone of the registry (or of one board's `Arc`) to whatever needs
/// team access; there is no global instance.
#[derive(Debug, Default, Clone)]
pub struct TeamBlackboards {
    boards: Arc<Mutex<BTreeMap<TeamId, Arc<TeamBlackboard>>>>,
}

impl TeamBlackboards {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<TeamId, Arc<TeamBlackboard>>> {
        self.boards.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_or_create(&self, team: TeamId) -> Arc<TeamBlackboard> {
        self.lock().entry(team).or_default().clone()
    }

    pub fn get(&self, team: TeamId) -> Option<Arc<TeamBlackboard>> {
        self.lock().get(&team).cloned()
    }

    /// Clear every board. Handles already given out stay valid and see the
    /// cleared state.
    pub fn reset_all(&self) {
        for board in self.lock().values() {
            board.reset();
        }
    }
}
