//! # Lifecycle States
//!
//! The engine-handle lifecycle and the authorization state machine variants.

use serde::{Deserialize, Serialize};

/// Lifecycle of the single live engine handle.
///
/// `Absent -> Present -> Destroyed`; no transition leaves `Destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleState {
    /// Not yet created.
    Absent,
    /// Usable.
    Present,
    /// Terminal. Further requests fail fast, except a close request which is
    /// treated as already satisfied.
    Destroyed,
}

/// Authorization state reported by the engine.
///
/// Exactly one value is current at any time; late subscribers observe the
/// latest value, not history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationState {
    Closed,
    WaitParameters,
    WaitEncryptionKey,
    WaitPhoneNumber,
    /// Waiting for the login code sent to the user. Re-armed when the engine
    /// rejects a code with `PHONE_CODE_INVALID`.
    WaitCode,
    WaitRegistration {
        /// Terms-of-service text shown to the user before registering.
        terms_of_service: Option<String>,
    },
    WaitPassword {
        /// Optional hint for the two-factor password.
        hint: Option<String>,
    },
    Ready,
    Closing,
}

impl AuthorizationState {
    /// True once the session is shutting down or gone.
    #[must_use]
    pub fn is_closing_or_closed(&self) -> bool {
        matches!(
            self,
            AuthorizationState::Closing | AuthorizationState::Closed
        )
    }
}
