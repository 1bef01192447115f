//! Authorization errors.

use shared_types::EngineError;
use sm_04_gateway::GatewayError;
use thiserror::Error;

/// Errors from the authorization state machine.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Session configuration is unusable (missing directory, wrong option
    /// type, missing identity).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The underlying gateway or transport failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The credential prompt collaborator failed to produce an answer.
    #[error("credential prompt failed: {0}")]
    Prompt(String),

    /// The engine rejected a request.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
