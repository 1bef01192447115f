//! # Engine Requests and Responses
//!
//! The closed set of requests the core issues against the engine, plus the
//! opaque response payload. The engine's own protocol is an external
//! collaborator; requests the core does not understand travel as `Raw`.

use crate::settings::SessionSettings;
use crate::state::AuthorizationState;
use serde::{Deserialize, Serialize};

/// Serde adapter carrying a JSON value as its text form.
///
/// The wire serializer is not self-describing, so free-form JSON cannot be
/// deserialized structurally; it travels as a string instead.
pub(crate) mod json_text {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &serde_json::Value,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<serde_json::Value, D::Error> {
        let text = String::deserialize(deserializer)?;
        serde_json::from_str(&text).map_err(D::Error::custom)
    }
}

/// Parameters sent to the engine when it asks for them at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParameters {
    pub use_test_datacenter: bool,
    pub database_directory: String,
    pub files_directory: String,
    pub use_file_database: bool,
    pub use_chat_info_database: bool,
    pub use_message_database: bool,
    pub api_id: i32,
    pub api_hash: String,
    pub system_language_code: String,
    pub device_model: String,
    pub system_version: String,
    pub application_version: String,
    pub enable_storage_optimizer: bool,
    pub ignore_file_names: bool,
}

impl EngineParameters {
    /// Build the parameter block from the session settings.
    #[must_use]
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            use_test_datacenter: settings.use_test_datacenter,
            database_directory: settings.database_directory.clone(),
            files_directory: settings.files_directory.clone(),
            use_file_database: settings.use_file_database,
            use_chat_info_database: settings.use_chat_info_database,
            use_message_database: settings.use_message_database,
            api_id: settings.api_id,
            api_hash: settings.api_hash.clone(),
            system_language_code: settings.system_language_code.clone(),
            device_model: settings.device_model.clone(),
            system_version: settings.system_version.clone(),
            application_version: settings.application_version.clone(),
            enable_storage_optimizer: settings.enable_storage_optimizer,
            ignore_file_names: settings.ignore_file_names,
        }
    }
}

/// Value of a named engine option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionValue {
    Empty,
    Boolean(bool),
    Integer(i64),
    Text(String),
}

/// A request into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineRequest {
    SetParameters(EngineParameters),
    CheckDatabaseEncryptionKey { key: Vec<u8> },
    SetAuthenticationPhoneNumber { phone_number: String },
    CheckAuthenticationBotToken { token: String },
    RegisterUser { first_name: String, last_name: String },
    CheckAuthenticationPassword { password: String },
    SetLogVerbosityLevel(i32),
    SetOption { name: String, value: OptionValue },
    GetOption { name: String },
    Close,
    /// Caller-supplied request the core routes without interpreting.
    Raw(#[serde(with = "json_text")] serde_json::Value),
}

impl EngineRequest {
    /// True for the request that asks the engine to shut down gracefully.
    /// Recognized so a close issued after destruction succeeds trivially.
    #[must_use]
    pub fn is_close(&self) -> bool {
        matches!(self, EngineRequest::Close)
    }
}

/// An opaque engine response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineObject {
    /// Plain acknowledgement.
    Ok,
    AuthorizationState(AuthorizationState),
    Option(OptionValue),
    /// Anything else the engine produced.
    Value(#[serde(with = "json_text")] serde_json::Value),
}
