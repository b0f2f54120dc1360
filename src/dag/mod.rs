// src/dag/mod.rs

//! Task ordering for `build`.
//!
//! - [`graph`] keeps the `after` adjacency lists.
//! - [`scheduler`] decides which tasks may start as others finish.

pub mod graph;
pub mod scheduler;

pub use graph::DagGraph;
pub use scheduler::{RunState, Scheduler, SchedulerStep};
