//! # Wire Envelopes
//!
//! The two framed units that cross node boundaries: the tri-state signal
//! envelope and the execute envelope. Both are immutable once constructed;
//! the binary framing itself lives in `sm-01-wire`.

use crate::request::EngineRequest;
use serde::{Deserialize, Serialize};

/// A tri-state signal carrying at most one payload.
///
/// Produced by the engine event source or by request completion; consumed by
/// the wire codec and by event multiplexer subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalEnvelope<T> {
    /// One payload item.
    Item(T),
    /// A terminal error with a human-readable message.
    Error(String),
    /// Normal completion of the stream; no further items follow.
    Complete,
}

impl<T> SignalEnvelope<T> {
    /// True for the `Complete` variant.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, SignalEnvelope::Complete)
    }

    /// True for the variants after which no further items follow.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalEnvelope::Item(_))
    }

    /// Map the item payload, leaving `Error` and `Complete` untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SignalEnvelope<U> {
        match self {
            SignalEnvelope::Item(item) => SignalEnvelope::Item(f(item)),
            SignalEnvelope::Error(message) => SignalEnvelope::Error(message),
            SignalEnvelope::Complete => SignalEnvelope::Complete,
        }
    }
}

/// One pending call into the engine.
///
/// Owned by the execution gateway until a matching result arrives or the
/// wait timeout fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteEnvelope {
    /// When true the request takes the engine's blocking execute path,
    /// otherwise the callback-based send path.
    pub execute_directly: bool,
    /// The request payload.
    pub request: EngineRequest,
}

impl ExecuteEnvelope {
    #[must_use]
    pub fn new(execute_directly: bool, request: EngineRequest) -> Self {
        Self {
            execute_directly,
            request,
        }
    }
}
