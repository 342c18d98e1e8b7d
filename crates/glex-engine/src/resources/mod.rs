//! Live GL object accounting.
//!
//! Every component that creates or deletes a GL object reports it to the
//! process-wide [`tracker()`], so hosts can spot leaks across surface
//! recreation.

mod tracker;

pub use tracker::{tracker, ResourceKind, ResourceStats, ResourceTracker};
