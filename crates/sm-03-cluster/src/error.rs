//! Cluster transport errors.

use thiserror::Error;

/// Errors from cluster formation and frame delivery.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A cluster of this role was already formed in this process.
    #[error("a {role} cluster was already formed in this process")]
    AlreadyFormed { role: &'static str },

    /// The configuration failed validation before formation.
    #[error("invalid cluster configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Nothing is subscribed at the target address.
    #[error("no subscribers registered at address '{address}'")]
    NoSubscribers { address: String },

    /// The transport could not deliver the frame.
    #[error("delivery failed at address '{address}': {reason}")]
    Delivery { address: String, reason: String },
}
