//! # Execution Gateway (sm-04)
//!
//! The single point of entry for issuing requests against whichever node
//! holds the live engine handle.
//!
//! The engine is a stateful, single-threaded, non-reentrant native client:
//! all calls into it, across the whole process, are serialized through
//! exactly one dedicated worker (the engine actor). Callers never touch the
//! engine directly; they hand requests to the gateway and await results.
//!
//! ## Handle lifecycle
//!
//! ```text
//! Absent ──initialize()──→ Present ──closed milestone / destroy()──→ Destroyed
//! ```
//!
//! No transition leaves `Destroyed`. A close request issued after
//! destruction succeeds trivially; anything else fails fast.
//!
//! ## Remote routing
//!
//! `GatewayServer` exposes a local gateway on the cluster bus;
//! `RemoteGateway` is the client side usable from any node. `LocalSession`
//! wires both over one in-process bus. Addresses are derived from a
//! caller-supplied alias: one for the point-to-point execute channel, one
//! for the broadcast event channel.

pub mod actor;
pub mod error;
pub mod gateway;
pub mod local;
pub mod ports;
pub mod remote;
pub mod stream;

pub use error::GatewayError;
pub use gateway::ExecutionGateway;
pub use local::LocalSession;
pub use ports::{ChatEngine, EngineFactory, SendCallback, SessionConnection};
pub use remote::{
    session_events_address, session_execute_address, GatewayServer, RemoteGateway,
};
pub use stream::{EventStream, ReceiveTermination};

use std::time::Duration;

/// How long `execute` waits for the handle to become `Present`.
pub const HANDLE_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Send timeout for request/response exchanges across the bus.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_millis(120_000);
