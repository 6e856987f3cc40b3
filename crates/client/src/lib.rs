//! `uxuy-client` -- the remote RPC boundary.
//!
//! [`client::RpcClient`] issues single logical JSON-RPC calls with a
//! bounded retry policy; [`session::AccountSession`] binds one
//! account's identity and proxy to the fixed vocabulary of remote
//! operations.  Workflows depend only on the [`session::FarmOps`] and
//! [`session::TaskOps`] seams, so they can be driven by mocks.

pub mod client;
pub mod session;

pub use client::{RpcClient, RpcError};
pub use session::{AccountSession, FarmOps, SessionAuth, TaskOps};
