//! # Session Settings
//!
//! The immutable configuration bundle for one session. Exactly one
//! authentication identity (phone number or bot token) must be set; the
//! builder turns a violation into a configuration error, never a runtime
//! transition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings construction errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("exactly one of phone number or bot token must be set")]
    MissingIdentity,
    #[error("phone number and bot token are mutually exclusive")]
    ConflictingIdentity,
    #[error("api_id and api_hash are required")]
    MissingApiCredentials,
}

/// The authentication identity method for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthIdentity {
    PhoneNumber(String),
    BotToken(String),
}

/// Immutable configuration for one chat-engine session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub database_directory: String,
    pub files_directory: String,
    pub use_test_datacenter: bool,
    pub use_file_database: bool,
    pub use_chat_info_database: bool,
    pub use_message_database: bool,
    pub enable_storage_optimizer: bool,
    pub ignore_file_names: bool,
    pub api_id: i32,
    pub api_hash: String,
    pub system_language_code: String,
    pub device_model: String,
    pub system_version: String,
    pub application_version: String,
    identity: AuthIdentity,
}

impl SessionSettings {
    /// Start building settings for the given API credentials.
    #[must_use]
    pub fn builder(api_id: i32, api_hash: impl Into<String>) -> SessionSettingsBuilder {
        SessionSettingsBuilder::new(api_id, api_hash)
    }

    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        match &self.identity {
            AuthIdentity::PhoneNumber(number) => Some(number),
            AuthIdentity::BotToken(_) => None,
        }
    }

    #[must_use]
    pub fn bot_token(&self) -> Option<&str> {
        match &self.identity {
            AuthIdentity::PhoneNumber(_) => None,
            AuthIdentity::BotToken(token) => Some(token),
        }
    }

    #[must_use]
    pub fn is_bot(&self) -> bool {
        matches!(self.identity, AuthIdentity::BotToken(_))
    }
}

/// Builder enforcing the one-identity invariant at construction time.
#[derive(Debug, Clone)]
pub struct SessionSettingsBuilder {
    database_directory: String,
    files_directory: String,
    use_test_datacenter: bool,
    use_file_database: bool,
    use_chat_info_database: bool,
    use_message_database: bool,
    enable_storage_optimizer: bool,
    ignore_file_names: bool,
    api_id: i32,
    api_hash: String,
    system_language_code: String,
    device_model: String,
    system_version: String,
    application_version: String,
    phone_number: Option<String>,
    bot_token: Option<String>,
}

impl SessionSettingsBuilder {
    #[must_use]
    pub fn new(api_id: i32, api_hash: impl Into<String>) -> Self {
        Self {
            database_directory: "session".to_string(),
            files_directory: String::new(),
            use_test_datacenter: false,
            use_file_database: true,
            use_chat_info_database: true,
            use_message_database: true,
            enable_storage_optimizer: true,
            ignore_file_names: false,
            api_id,
            api_hash: api_hash.into(),
            system_language_code: "en".to_string(),
            device_model: "sessionmesh".to_string(),
            system_version: "unknown".to_string(),
            application_version: env!("CARGO_PKG_VERSION").to_string(),
            phone_number: None,
            bot_token: None,
        }
    }

    #[must_use]
    pub fn database_directory(mut self, dir: impl Into<String>) -> Self {
        self.database_directory = dir.into();
        self
    }

    #[must_use]
    pub fn files_directory(mut self, dir: impl Into<String>) -> Self {
        self.files_directory = dir.into();
        self
    }

    #[must_use]
    pub fn use_test_datacenter(mut self, enabled: bool) -> Self {
        self.use_test_datacenter = enabled;
        self
    }

    #[must_use]
    pub fn use_file_database(mut self, enabled: bool) -> Self {
        self.use_file_database = enabled;
        self
    }

    #[must_use]
    pub fn use_chat_info_database(mut self, enabled: bool) -> Self {
        self.use_chat_info_database = enabled;
        self
    }

    #[must_use]
    pub fn use_message_database(mut self, enabled: bool) -> Self {
        self.use_message_database = enabled;
        self
    }

    #[must_use]
    pub fn enable_storage_optimizer(mut self, enabled: bool) -> Self {
        self.enable_storage_optimizer = enabled;
        self
    }

    #[must_use]
    pub fn ignore_file_names(mut self, enabled: bool) -> Self {
        self.ignore_file_names = enabled;
        self
    }

    #[must_use]
    pub fn system_language_code(mut self, code: impl Into<String>) -> Self {
        self.system_language_code = code.into();
        self
    }

    #[must_use]
    pub fn device_model(mut self, model: impl Into<String>) -> Self {
        self.device_model = model.into();
        self
    }

    #[must_use]
    pub fn system_version(mut self, version: impl Into<String>) -> Self {
        self.system_version = version.into();
        self
    }

    #[must_use]
    pub fn application_version(mut self, version: impl Into<String>) -> Self {
        self.application_version = version.into();
        self
    }

    #[must_use]
    pub fn phone_number(mut self, number: impl Into<String>) -> Self {
        self.phone_number = Some(number.into());
        self
    }

    #[must_use]
    pub fn bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    /// Finish the settings, validating the identity invariant.
    pub fn build(self) -> Result<SessionSettings, SettingsError> {
        if self.api_hash.is_empty() || self.api_id == 0 {
            return Err(SettingsError::MissingApiCredentials);
        }
        let identity = match (self.phone_number, self.bot_token) {
            (Some(number), None) => AuthIdentity::PhoneNumber(number),
            (None, Some(token)) => AuthIdentity::BotToken(token),
            (None, None) => return Err(SettingsError::MissingIdentity),
            (Some(_), Some(_)) => return Err(SettingsError::ConflictingIdentity),
        };
        Ok(SessionSettings {
            database_directory: self.database_directory,
            files_directory: self.files_directory,
            use_test_datacenter: self.use_test_datacenter,
            use_file_database: self.use_file_database,
            use_chat_info_database: self.use_chat_info_database,
            use_message_database: self.use_message_database,
            enable_storage_optimizer: self.enable_storage_optimizer,
            ignore_file_names: self.ignore_file_names,
            api_id: self.api_id,
            api_hash: self.api_hash,
            system_language_code: self.system_language_code,
            device_model: self.device_model,
            system_version: self.system_version,
            application_version: self.application_version,
            identity,
        })
    }
}
