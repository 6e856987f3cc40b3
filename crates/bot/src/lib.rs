//! `uxuy-bot` -- the multi-account execution engine.
//!
//! Drives every configured account through the authenticate -> register
//! -> tasks -> farm sequence, in isolated concurrent units bounded by
//! the batch size, forever.  One account's failure never aborts
//! another's; the scheduler always proceeds to the next batch and the
//! next cycle.

pub mod accounts;
pub mod error;
pub mod farming;
pub mod fingerprint;
pub mod runner;
pub mod scheduler;
pub mod tasks;

pub use error::RunError;
