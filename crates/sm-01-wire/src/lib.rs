//! # Wire Codec (sm-01)
//!
//! Deterministic, self-describing binary framing for the envelopes that cross
//! node boundaries. Safe to decode from a byte cursor embedded in a larger
//! buffer: every decode reports how many bytes it consumed.
//!
//! ## Wire formats
//!
//! Signal envelope:
//!
//! ```text
//! byte 0       : 0x01 Item | 0x02 Error | 0x03 Complete
//! Item    ...  : <inner-codec bytes>
//! Error   ...  : int32 (big-endian) message byte length, then UTF-8 bytes
//! Complete     : (no further bytes)
//! ```
//!
//! Execute envelope:
//!
//! ```text
//! byte 0       : boolean execute_directly (0x00 / 0x01)
//! bytes 1..N   : bincode-serialized request payload
//! ```
//!
//! Codec identity is a name string, unique per inner payload type. Two
//! envelopes wrapping different payload types must never be cross-decoded;
//! the caller prevents that by construction, not by runtime check.

pub mod error;
pub mod execute;
pub mod signal;

pub use error::WireError;
pub use execute::{ExecuteCodec, ResultCodec};
pub use signal::{update_signal_codec, BincodePayloadCodec, PayloadCodec, SignalCodec, UpdateCodec};

/// Signal envelope tag bytes.
pub const TAG_ITEM: u8 = 0x01;
pub const TAG_ERROR: u8 = 0x02;
pub const TAG_COMPLETE: u8 = 0x03;
