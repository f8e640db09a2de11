#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of a single node update.
///
/// The set is closed: every node update resolves to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeStatus {
    Running,
    Success,
    Fail,
}

impl NodeStatus {
    pub fn is_running(self) -> bool {
        self == NodeStatus::Running
    }

    /// `true` for `Success` and `Fail`.
    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    pub fn from_bool(ok: bool) -> Self {
        if ok {
            NodeStatus::Success
        } else {
            NodeStatus::Fail
        }
    }
}
