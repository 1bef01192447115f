//! Gateway errors.

use sm_01_wire::WireError;
use sm_03_cluster::ClusterError;
use thiserror::Error;

/// Errors from the execution gateway and its remote routing layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The handle stayed `Absent` past the wait timeout.
    #[error("timed out waiting for the engine handle to become present")]
    Timeout,

    /// The handle is `Destroyed` and the request is not a close request.
    #[error("engine handle is destroyed; request rejected")]
    EngineUnavailable,

    /// `initialize` was called on a gateway that already holds an engine.
    #[error("engine already initialized for this gateway")]
    AlreadyInitialized,

    /// The engine actor or an internal channel is gone.
    #[error("engine channel closed unexpectedly")]
    ChannelClosed,

    /// `initialize` was called outside a tokio runtime; the event pump has
    /// nowhere to run.
    #[error("no tokio runtime available for the event pump")]
    NoRuntime,

    /// The cluster transport could not deliver a frame.
    #[error(transparent)]
    Delivery(#[from] ClusterError),

    /// Envelope encode/decode failed.
    #[error(transparent)]
    Wire(#[from] WireError),
}
