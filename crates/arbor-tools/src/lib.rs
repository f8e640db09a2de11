//! Status observation for arbor behaviour trees.
//!
//! Visualization and debugging tools subscribe observers to a tree; the tree
//! pushes a [`StatusEvent`] after every node update. Observers are passive:
//! the runtime never depends on them for correctness.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    LogObserver, NullObserver, RecordingObserver, StatusEvent, StatusObserver, TraceLog,
};
