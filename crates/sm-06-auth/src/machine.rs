//! The authorization state machine facade.

use crate::driver;
use crate::error::AuthError;
use crate::feed::FeedSubscription;
use crate::prompt::CredentialPrompt;
use shared_types::{
    AuthorizationState, EngineError, EngineObject, EngineRequest, EngineResult, EngineUpdate,
    FatalErrorType, OptionValue, SessionSettings,
};
use sm_04_gateway::SessionConnection;
use sm_05_multiplexer::EventMultiplexer;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::info;

const FEED_CAPACITY: usize = 1000;

/// Shared state between the facade and its driver task.
pub(crate) struct Core {
    pub(crate) settings: SessionSettings,
    pub(crate) connection: Arc<dyn SessionConnection>,
    pub(crate) prompt: Arc<dyn CredentialPrompt>,
    pub(crate) session_name: String,
    pub(crate) state_tx: watch::Sender<AuthorizationState>,
    pub(crate) updates_tx: broadcast::Sender<EngineUpdate>,
    pub(crate) errors_tx: broadcast::Sender<EngineError>,
    pub(crate) fatal_tx: broadcast::Sender<FatalErrorType>,
    pub(crate) close_requested: AtomicBool,
    pub(crate) ready: AtomicBool,
    /// Set once the engine has reported any authorization state; before
    /// that the cell's default `Closed` does not mean the engine is closed.
    pub(crate) started: AtomicBool,
}

impl Core {
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub(crate) fn is_close_requested(&self) -> bool {
        self.close_requested.load(Ordering::SeqCst)
    }
}

/// Drives one engine through login and shutdown.
pub struct AuthorizationStateMachine {
    core: Arc<Core>,
}

impl AuthorizationStateMachine {
    /// Arm the machine: ensure the session directory exists, subscribe to
    /// the event feed and start the driver task.
    pub async fn create(
        settings: SessionSettings,
        connection: Arc<dyn SessionConnection>,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Result<Self, AuthError> {
        std::fs::create_dir_all(&settings.database_directory).map_err(|e| {
            AuthError::Configuration(format!(
                "can't create session directory {}: {e}",
                settings.database_directory
            ))
        })?;

        let session_name = Path::new(&settings.database_directory)
            .file_name()
            .map_or_else(|| settings.database_directory.clone(), |n| n.to_string_lossy().into_owned());

        let multiplexer = EventMultiplexer::new(connection.clone());
        let events = multiplexer.subscribe().await?;

        let (state_tx, _) = watch::channel(AuthorizationState::Closed);
        let (updates_tx, _) = broadcast::channel(FEED_CAPACITY);
        let (errors_tx, _) = broadcast::channel(FEED_CAPACITY);
        let (fatal_tx, _) = broadcast::channel(FEED_CAPACITY);
        let core = Arc::new(Core {
            settings,
            connection,
            prompt,
            session_name: session_name.clone(),
            state_tx,
            updates_tx,
            errors_tx,
            fatal_tx,
            close_requested: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            started: AtomicBool::new(false),
        });

        info!(session = %session_name, "Authorization machine armed");
        tokio::spawn(driver::drive(core.clone(), events));
        Ok(Self { core })
    }

    /// The most recently observed authorization state.
    #[must_use]
    pub fn state(&self) -> AuthorizationState {
        self.core.state_tx.borrow().clone()
    }

    /// Watch the state cell. Late subscribers observe the current value,
    /// never history.
    #[must_use]
    pub fn state_watch(&self) -> watch::Receiver<AuthorizationState> {
        self.core.state_tx.subscribe()
    }

    /// Engine updates produced after the `Ready` state was reached.
    #[must_use]
    pub fn updates(&self) -> FeedSubscription<EngineUpdate> {
        FeedSubscription::new(self.core.updates_tx.subscribe(), "updates")
    }

    /// Non-fatal engine errors, including recoverable login rejections.
    #[must_use]
    pub fn errors(&self) -> FeedSubscription<EngineError> {
        FeedSubscription::new(self.core.errors_tx.subscribe(), "errors")
    }

    /// Fatal errors. No corrective request is ever issued for these.
    #[must_use]
    pub fn fatal_errors(&self) -> FeedSubscription<FatalErrorType> {
        FeedSubscription::new(self.core.fatal_tx.subscribe(), "fatal")
    }

    /// Request graceful shutdown. Idempotent: a second call, or a call while
    /// the engine is already closing or closed, is a no-op.
    pub async fn close(&self) -> Result<(), AuthError> {
        if self.core.started.load(Ordering::SeqCst) && self.state().is_closing_or_closed() {
            return Ok(());
        }
        if self
            .core
            .close_requested
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }
        info!(session = %self.core.session_name, "Close requested");
        self.core
            .connection
            .execute(EngineRequest::Close, false)
            .await?
            .into_result()?;
        Ok(())
    }

    /// Send one request through the engine's asynchronous path.
    pub async fn send(
        &self,
        request: EngineRequest,
    ) -> Result<EngineResult<EngineObject>, AuthError> {
        Ok(self.core.connection.execute(request, false).await?)
    }

    /// Run one request through the engine's blocking execute path.
    pub async fn execute(
        &self,
        request: EngineRequest,
    ) -> Result<EngineResult<EngineObject>, AuthError> {
        Ok(self.core.connection.execute(request, true).await?)
    }

    /// Set the engine's native log verbosity.
    pub async fn set_verbosity_level(&self, level: i32) -> Result<(), AuthError> {
        self.send(EngineRequest::SetLogVerbosityLevel(level))
            .await?
            .into_result()?;
        Ok(())
    }

    /// Set a named engine option.
    pub async fn set_option(&self, name: impl Into<String>, value: OptionValue) -> Result<(), AuthError> {
        self.send(EngineRequest::SetOption {
            name: name.into(),
            value,
        })
        .await?
        .into_result()?;
        Ok(())
    }

    /// Read a string option. `None` when the option is unset.
    pub async fn get_option_string(&self, name: &str) -> Result<Option<String>, AuthError> {
        match self.request_option(name).await? {
            OptionValue::Text(value) => Ok(Some(value)),
            OptionValue::Empty => Ok(None),
            other => Err(AuthError::Configuration(format!(
                "option {name} is not a string: {other:?}"
            ))),
        }
    }

    /// Read an integer option. `None` when the option is unset.
    pub async fn get_option_integer(&self, name: &str) -> Result<Option<i64>, AuthError> {
        match self.request_option(name).await? {
            OptionValue::Integer(value) => Ok(Some(value)),
            OptionValue::Empty => Ok(None),
            other => Err(AuthError::Configuration(format!(
                "option {name} is not an integer: {other:?}"
            ))),
        }
    }

    /// Read a boolean option. `None` when the option is unset.
    pub async fn get_option_boolean(&self, name: &str) -> Result<Option<bool>, AuthError> {
        match self.request_option(name).await? {
            OptionValue::Boolean(value) => Ok(Some(value)),
            OptionValue::Empty => Ok(None),
            other => Err(AuthError::Configuration(format!(
                "option {name} is not a boolean: {other:?}"
            ))),
        }
    }

    async fn request_option(&self, name: &str) -> Result<OptionValue, AuthError> {
        let object = self
            .send(EngineRequest::GetOption { name: name.into() })
            .await?
            .into_result()?;
        match object {
            EngineObject::Option(value) => Ok(value),
            other => Err(AuthError::Configuration(format!(
                "option {name} produced a non-option response: {other:?}"
            ))),
        }
    }

    /// Whether this session authenticates as a bot.
    #[must_use]
    pub fn is_bot(&self) -> bool {
        self.core.settings.is_bot()
    }
}
