//! # Authorization State Machine (sm-06)
//!
//! Drives a newly-initialized engine through its login sequence and manages
//! graceful, idempotent shutdown including artifact cleanup.
//!
//! The machine consumes the multiplexed engine event feed sequentially.
//! Every event first passes an error pre-filter: invalid-code and
//! invalid-password rejections are recoverable (the matching wait state is
//! re-armed and the error surfaces on the non-fatal stream); an invalid
//! phone number, invalid bot token, or killed connection is fatal and gets
//! no corrective request. Downstream consumers only observe events produced
//! after the `Ready` state; everything before that is consumed internally.

pub mod driver;
pub mod error;
pub mod feed;
pub mod machine;
pub mod prompt;

pub use error::AuthError;
pub use feed::FeedSubscription;
pub use machine::AuthorizationStateMachine;
pub use prompt::{CredentialPrompt, PromptQuestion, MAX_NAME_LEN};
