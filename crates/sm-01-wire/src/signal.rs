//! # Signal Envelope Codec
//!
//! Tag-prefixed framing for `SignalEnvelope<T>`, generic over an inner
//! payload codec. The signal codec's name is derived from the inner codec's
//! name so envelopes wrapping different payload types are never registered
//! under the same identity.

use crate::error::WireError;
use crate::{TAG_COMPLETE, TAG_ERROR, TAG_ITEM};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{EngineUpdate, SignalEnvelope};
use std::marker::PhantomData;

/// Binary framing for one inner payload type.
///
/// `name()` must be unique per payload type; it is the codec's identity in
/// the cluster registry.
pub trait PayloadCodec<T> {
    fn name(&self) -> &str;
    fn encode(&self, payload: &T, out: &mut Vec<u8>) -> Result<(), WireError>;
    fn decode(&self, buffer: &[u8], offset: usize) -> Result<(T, usize), WireError>;
}

/// Codec for `SignalEnvelope<T>` wrapping an inner payload codec.
pub struct SignalCodec<T, C: PayloadCodec<T>> {
    name: String,
    inner: C,
    _marker: PhantomData<T>,
}

impl<T, C: PayloadCodec<T>> SignalCodec<T, C> {
    #[must_use]
    pub fn new(inner: C) -> Self {
        let name = format!("SignalCodec-{}", inner.name());
        Self {
            name,
            inner,
            _marker: PhantomData,
        }
    }

    /// The codec identity: `"SignalCodec-" + inner codec name`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append the envelope's wire form to `out`.
    pub fn encode(&self, envelope: &SignalEnvelope<T>, out: &mut Vec<u8>) -> Result<(), WireError> {
        match envelope {
            SignalEnvelope::Item(item) => {
                out.push(TAG_ITEM);
                self.inner.encode(item, out)?;
            }
            SignalEnvelope::Error(message) => {
                out.push(TAG_ERROR);
                let bytes = message.as_bytes();
                out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                out.extend_from_slice(bytes);
            }
            SignalEnvelope::Complete => {
                out.push(TAG_COMPLETE);
            }
        }
        Ok(())
    }

    /// Decode one envelope starting at `offset`, returning it together with
    /// the number of bytes consumed.
    pub fn decode(
        &self,
        buffer: &[u8],
        offset: usize,
    ) -> Result<(SignalEnvelope<T>, usize), WireError> {
        WireError::need(buffer, offset, 1)?;
        let tag = buffer[offset];
        match tag {
            TAG_ITEM => {
                let (item, consumed) = self.inner.decode(buffer, offset + 1)?;
                Ok((SignalEnvelope::Item(item), consumed + 1))
            }
            TAG_ERROR => {
                WireError::need(buffer, offset + 1, 4)?;
                let mut len_bytes = [0u8; 4];
                len_bytes.copy_from_slice(&buffer[offset + 1..offset + 5]);
                let raw_len = i32::from_be_bytes(len_bytes);
                if raw_len < 0 {
                    return Err(WireError::InvalidLength {
                        length: raw_len,
                        offset: offset + 1,
                    });
                }
                let len = raw_len as usize;
                WireError::need(buffer, offset + 5, len)?;
                let message = String::from_utf8(buffer[offset + 5..offset + 5 + len].to_vec())?;
                Ok((SignalEnvelope::Error(message), 5 + len))
            }
            TAG_COMPLETE => Ok((SignalEnvelope::Complete, 1)),
            other => Err(WireError::UnknownTag { tag: other, offset }),
        }
    }
}

/// Length-prefixed bincode framing for any serde payload.
///
/// The external request/response serialization collaborator; distinct
/// payload types get distinct names.
pub struct BincodePayloadCodec<T> {
    name: String,
    _marker: PhantomData<T>,
}

impl<T> BincodePayloadCodec<T> {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> PayloadCodec<T> for BincodePayloadCodec<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, payload: &T, out: &mut Vec<u8>) -> Result<(), WireError> {
        let bytes = bincode::serialize(payload)?;
        out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(&bytes);
        Ok(())
    }

    fn decode(&self, buffer: &[u8], offset: usize) -> Result<(T, usize), WireError> {
        WireError::need(buffer, offset, 4)?;
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&buffer[offset..offset + 4]);
        let len = u32::from_be_bytes(len_bytes) as usize;
        WireError::need(buffer, offset + 4, len)?;
        let payload = bincode::deserialize(&buffer[offset + 4..offset + 4 + len])?;
        Ok((payload, 4 + len))
    }
}

/// The inner codec for engine updates carried on event channels.
pub type UpdateCodec = BincodePayloadCodec<EngineUpdate>;

/// Codec for the engine-update event channel.
#[must_use]
pub fn update_signal_codec() -> SignalCodec<EngineUpdate, UpdateCodec> {
    SignalCodec::new(UpdateCodec::new("EngineUpdateCodec"))
}
