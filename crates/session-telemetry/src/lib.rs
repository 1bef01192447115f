//! # Session Telemetry
//!
//! Structured logging bootstrap shared by every SessionMesh node. Installs a
//! `tracing-subscriber` registry with an environment-derived level filter and
//! either a human-readable or a JSON formatter.

pub mod config;
pub mod init;

pub use config::TelemetryConfig;
pub use init::{init_tracing, TelemetryError, TelemetryGuard};
