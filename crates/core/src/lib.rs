//! `uxuy-core` -- pure domain logic for the multi-account engine.
//!
//! No network I/O lives here.  This crate holds the pieces that can be
//! reasoned about (and tested) without touching the remote service:
//! settings parsing, bearer-credential decoding, the farm and task
//! state machines, and the user-agent pool.

pub mod agents;
pub mod config;
pub mod error;
pub mod farm;
pub mod identity;
pub mod task;
