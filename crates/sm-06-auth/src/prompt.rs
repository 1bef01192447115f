//! The credential prompt collaborator.
//!
//! Registration names and the two-factor password cannot come from
//! configuration; they are asked for interactively through this seam.

use crate::error::AuthError;
use async_trait::async_trait;

/// Maximum length accepted for a first or last name.
pub const MAX_NAME_LEN: usize = 64;

/// One question put to the prompt collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptQuestion {
    FirstName,
    LastName,
    Password {
        /// Optional hint stored with the two-factor password.
        hint: Option<String>,
    },
}

/// Asks the operator (or a test script) for a credential.
#[async_trait]
pub trait CredentialPrompt: Send + Sync {
    async fn ask(&self, session_name: &str, question: PromptQuestion) -> Result<String, AuthError>;
}

/// Validate a first name: non-blank, at most [`MAX_NAME_LEN`] characters.
#[must_use]
pub fn first_name_valid(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_NAME_LEN
}

/// Validate a last name: at most [`MAX_NAME_LEN`] characters, blank allowed.
#[must_use]
pub fn last_name_valid(name: &str) -> bool {
    name.trim().chars().count() <= MAX_NAME_LEN
}
