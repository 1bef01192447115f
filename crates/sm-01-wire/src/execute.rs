//! # Execute and Result Codecs
//!
//! One boolean byte then the serialized request payload; the result codec is
//! the reply-side framing used by the gateway server to answer execute
//! envelopes across the bus.

use crate::error::WireError;
use crate::signal::{BincodePayloadCodec, PayloadCodec};
use shared_types::{EngineObject, EngineRequest, EngineResult, ExecuteEnvelope};

/// Codec for `ExecuteEnvelope`.
pub struct ExecuteCodec {
    request_codec: BincodePayloadCodec<EngineRequest>,
}

impl ExecuteCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_codec: BincodePayloadCodec::new("EngineRequestCodec"),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        "ExecuteObjectCodec"
    }

    pub fn encode(&self, envelope: &ExecuteEnvelope, out: &mut Vec<u8>) -> Result<(), WireError> {
        out.push(u8::from(envelope.execute_directly));
        self.request_codec.encode(&envelope.request, out)
    }

    pub fn decode(
        &self,
        buffer: &[u8],
        offset: usize,
    ) -> Result<(ExecuteEnvelope, usize), WireError> {
        WireError::need(buffer, offset, 1)?;
        let execute_directly = match buffer[offset] {
            0x00 => false,
            0x01 => true,
            byte => return Err(WireError::InvalidBool { byte }),
        };
        let (request, consumed) = self.request_codec.decode(buffer, offset + 1)?;
        Ok((ExecuteEnvelope::new(execute_directly, request), consumed + 1))
    }
}

impl Default for ExecuteCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Codec for `EngineResult<EngineObject>` reply frames.
///
/// One side byte (0x00 value, 0x01 error) then the bincode payload of the
/// populated side. The XOR invariant of the result is preserved on the wire.
pub struct ResultCodec {
    object_codec: BincodePayloadCodec<EngineObject>,
    error_codec: BincodePayloadCodec<shared_types::EngineError>,
}

const SIDE_VALUE: u8 = 0x00;
const SIDE_ERROR: u8 = 0x01;

impl ResultCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            object_codec: BincodePayloadCodec::new("EngineObjectCodec"),
            error_codec: BincodePayloadCodec::new("EngineErrorCodec"),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        "EngineResultCodec"
    }

    pub fn encode(
        &self,
        result: &EngineResult<EngineObject>,
        out: &mut Vec<u8>,
    ) -> Result<(), WireError> {
        match result {
            EngineResult::Ok(object) => {
                out.push(SIDE_VALUE);
                self.object_codec.encode(object, out)
            }
            EngineResult::Err(error) => {
                out.push(SIDE_ERROR);
                self.error_codec.encode(error, out)
            }
        }
    }

    pub fn decode(
        &self,
        buffer: &[u8],
        offset: usize,
    ) -> Result<(EngineResult<EngineObject>, usize), WireError> {
        WireError::need(buffer, offset, 1)?;
        match buffer[offset] {
            SIDE_VALUE => {
                let (object, consumed) = self.object_codec.decode(buffer, offset + 1)?;
                Ok((EngineResult::Ok(object), consumed + 1))
            }
            SIDE_ERROR => {
                let (error, consumed) = self.error_codec.decode(buffer, offset + 1)?;
                Ok((EngineResult::Err(error), consumed + 1))
            }
            tag => Err(WireError::UnknownTag { tag, offset }),
        }
    }
}

impl Default for ResultCodec {
    fn default() -> Self {
        Self::new()
    }
}
