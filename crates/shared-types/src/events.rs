//! # Engine Events
//!
//! The single typed event channel carried from the engine's callback trio
//! into the rest of the system, plus the fatal-error classification.

use crate::result::EngineError;
use crate::state::AuthorizationState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fatal authorization failures. The state machine takes no corrective
/// action for these; the caller is expected to tear the session down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatalErrorType {
    PhoneNumberInvalid,
    AccessTokenInvalid,
    ConnectionKilled,
}

impl FatalErrorType {
    /// Classify an engine error message, if it names a fatal condition.
    #[must_use]
    pub fn from_message(message: &str) -> Option<Self> {
        match message {
            "PHONE_NUMBER_INVALID" => Some(FatalErrorType::PhoneNumberInvalid),
            "ACCESS_TOKEN_INVALID" => Some(FatalErrorType::AccessTokenInvalid),
            "CONNECTION_KILLED" => Some(FatalErrorType::ConnectionKilled),
            _ => None,
        }
    }
}

impl fmt::Display for FatalErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FatalErrorType::PhoneNumberInvalid => "PHONE_NUMBER_INVALID",
            FatalErrorType::AccessTokenInvalid => "ACCESS_TOKEN_INVALID",
            FatalErrorType::ConnectionKilled => "CONNECTION_KILLED",
        };
        write!(f, "{name}")
    }
}

/// One update produced by the engine's event feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineUpdate {
    /// The engine moved to a new authorization state.
    AuthorizationState(AuthorizationState),
    /// The engine reported an error not tied to a request.
    Error(EngineError),
    /// Any other engine update, routed without interpretation.
    Generic(#[serde(with = "crate::request::json_text")] serde_json::Value),
}

impl EngineUpdate {
    /// The authorization state carried by this update, if any.
    #[must_use]
    pub fn authorization_state(&self) -> Option<&AuthorizationState> {
        match self {
            EngineUpdate::AuthorizationState(state) => Some(state),
            _ => None,
        }
    }
}

/// The typed channel replacing the engine's three callback registrations
/// (event callback, error callback, fatal callback).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    Update(EngineUpdate),
    EngineError(EngineError),
    /// The native layer failed in a way the engine cannot recover from.
    FatalError(String),
    /// The engine reached its closed life-cycle milestone.
    ClosedMilestone,
}
