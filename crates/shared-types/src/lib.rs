//! # Shared Types Crate
//!
//! This crate contains all session domain types shared across subsystems:
//! the wire envelopes, the two-sided engine result, the handle and
//! authorization lifecycle enums, and the immutable session settings bundle.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **One-sided Results**: `EngineResult<T>` holds exactly one of a value or
//!   an engine error, never both.
//! - **One Identity**: `SessionSettings` carries exactly one authentication
//!   identity (phone number or bot token); the builder enforces it.

pub mod envelope;
pub mod events;
pub mod request;
pub mod result;
pub mod settings;
pub mod state;

pub use envelope::{ExecuteEnvelope, SignalEnvelope};
pub use events::{EngineSignal, EngineUpdate, FatalErrorType};
pub use request::{EngineObject, EngineParameters, EngineRequest, OptionValue};
pub use result::{EngineError, EngineResult};
pub use settings::{SessionSettings, SessionSettingsBuilder, SettingsError};
pub use state::{AuthorizationState, HandleState};
