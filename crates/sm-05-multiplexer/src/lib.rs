//! # Event Multiplexer (sm-05)
//!
//! Fans one session event feed out to any number of subscribers while
//! holding at most one upstream subscription.
//!
//! The upstream is opened lazily when the first subscriber arrives, shared
//! by everyone who subscribes while it is live, and cancelled when the last
//! subscriber goes away. Once the feed terminates, the terminal envelope is
//! replayed to late subscribers instead of reopening the upstream.

pub mod multiplexer;

pub use multiplexer::{EventMultiplexer, MuxStream};
