// src/exec/mod.rs

//! Task execution layer for watch mode.
//!
//! - [`executor_loop`] owns the loop that spawns task runs.
//! - [`runner`] runs a single task and reports back via `RuntimeEvent`s.
//! - [`backend`] provides the `ExecutorBackend` trait the runtime talks to,
//!   which tests replace with a fake.

pub mod backend;
pub mod executor_loop;
pub mod runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
