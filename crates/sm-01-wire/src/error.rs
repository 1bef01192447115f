//! Codec error types.

use thiserror::Error;

/// Errors from encoding or decoding wire envelopes.
#[derive(Debug, Error)]
pub enum WireError {
    /// The tag byte does not name a known envelope variant.
    #[error("unknown envelope tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    /// The buffer ended before the envelope did.
    #[error("truncated buffer: needed {needed} bytes at offset {offset}, had {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A boolean byte was neither 0x00 nor 0x01.
    #[error("invalid boolean byte 0x{byte:02x}")]
    InvalidBool { byte: u8 },

    /// A length prefix was negative.
    #[error("invalid length prefix {length} at offset {offset}")]
    InvalidLength { length: i32, offset: usize },

    /// The error message payload was not valid UTF-8.
    #[error("error message is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The inner payload serializer failed.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}

impl WireError {
    pub(crate) fn need(buffer: &[u8], offset: usize, needed: usize) -> Result<(), WireError> {
        if buffer.len() < offset + needed {
            return Err(WireError::Truncated {
                offset,
                needed,
                available: buffer.len().saturating_sub(offset),
            });
        }
        Ok(())
    }
}
