use uxuy_client::RpcError;
use uxuy_core::error::CoreError;

/// Per-account failures reported up to the scheduler.
///
/// Failures are contained at the smallest scope that can act on them;
/// anything surfacing here means the whole account was skipped for the
/// remainder of the cycle.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The bearer credential is expired or carries no expiry; the
    /// account is skipped without any further remote calls.
    #[error("credential expired, account skipped")]
    AuthExpired,

    /// The assigned proxy could not produce a working egress route.
    #[error("proxy unusable: {0}")]
    ProxyUnusable(String),

    /// The account run exceeded its absolute wall-clock deadline.
    #[error("account run exceeded its deadline")]
    Timeout,

    /// The account's unit task was aborted or panicked.
    #[error("account unit aborted: {0}")]
    Aborted(String),

    /// The credential could not be decoded at all.
    #[error(transparent)]
    Identity(#[from] CoreError),

    /// A remote call failed in a way the workflows could not contain.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}
