// src/watch/mod.rs

//! File watching and change detection.
//!
//! Compiles each task's watch bindings, runs a `notify` watcher over their
//! base directories and turns settled batches of changes into task
//! triggers. Optional content hashing drops events that did not change a
//! file.
//!
//! It knows nothing about how tasks run; it only produces triggers.

pub mod debounce;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::next_batch;
pub use hash::{compute_file_hash, ContentHashes};
pub use patterns::{
    build_profiles_from_config, collect_matching_files, tasks_for_path, watch_roots,
    TaskWatchProfile,
};
pub use watcher::{spawn_watcher, WatchOptions, WatcherHandle};
