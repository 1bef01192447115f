//! # Cluster Transport (sm-03)
//!
//! Forms cluster membership (master/worker roles) and exposes the
//! address-scoped publish/subscribe surface every other subsystem routes
//! through. Discovery is a static TCP member list; there is no multicast and
//! no cloud discovery. The replicated-state channel is mutual-TLS with a
//! fixed minimum protocol set.
//!
//! ## Formation rules
//!
//! At most one master formation attempt and at most one worker formation
//! attempt may succeed per process lifetime. The guards are process-wide
//! state, set once, never reset: a second attempt is a programming error,
//! not a retryable condition.
//!
//! ## Delivery
//!
//! Transport-level send failures surface to the caller as a delivery error;
//! this layer never retries. Retry policy belongs to the execution gateway.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bus;
pub mod config;
pub mod error;
pub mod formation;
pub mod registry;

pub use bus::{Frame, Subscription};
pub use config::{
    ClusterConfig, MapMergePolicy, SemaphoreConfig, StorePaths, SubscriptionMapConfig, TlsConfig,
    TlsVersion,
};
pub use error::ClusterError;
pub use formation::{form_master, form_worker, ClusterHandle, NodeRole};
pub use registry::CodecRegistry;

/// Maximum frames buffered per subscriber before back-pressure drops.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Outbound connect timeout for cluster channels, milliseconds.
pub const CONNECT_TIMEOUT_MS: u64 = 120_000;
