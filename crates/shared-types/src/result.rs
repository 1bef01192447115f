//! # Engine Results
//!
//! The two-sided result returned by every call into the engine: exactly one
//! of a value or an engine-reported error is populated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An error object reported by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for EngineError {}

/// Result of one engine call.
///
/// Invariant: exactly one side is populated. The enum representation makes
/// the XOR structural rather than checked at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineResult<T> {
    Ok(T),
    Err(EngineError),
}

impl<T> EngineResult<T> {
    #[must_use]
    pub fn ok(value: T) -> Self {
        EngineResult::Ok(value)
    }

    #[must_use]
    pub fn err(code: i32, message: impl Into<String>) -> Self {
        EngineResult::Err(EngineError::new(code, message))
    }

    #[must_use]
    pub fn is_err(&self) -> bool {
        matches!(self, EngineResult::Err(_))
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<T, EngineError> {
        match self {
            EngineResult::Ok(value) => Ok(value),
            EngineResult::Err(error) => Err(error),
        }
    }

    /// Map the success payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EngineResult<U> {
        match self {
            EngineResult::Ok(value) => EngineResult::Ok(f(value)),
            EngineResult::Err(error) => EngineResult::Err(error),
        }
    }

    /// Borrow the error side, if populated.
    #[must_use]
    pub fn error(&self) -> Option<&EngineError> {
        match self {
            EngineResult::Ok(_) => None,
            EngineResult::Err(error) => Some(error),
        }
    }
}
