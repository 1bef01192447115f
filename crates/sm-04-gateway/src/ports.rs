//! Port traits: the opaque engine collaborator and the session connection
//! seam consumed by the multiplexer and the authorization layer.

use crate::error::GatewayError;
use crate::stream::EventStream;
use async_trait::async_trait;
use shared_types::{EngineObject, EngineRequest, EngineResult, EngineSignal};
use tokio::sync::mpsc;

/// Callback invoked with the result of an asynchronous engine send.
pub type SendCallback = Box<dyn FnOnce(EngineResult<EngineObject>) + Send>;

/// The opaque chat-engine client.
///
/// Implementations are not safe for concurrent use; the gateway guarantees
/// that every call happens on one dedicated worker.
pub trait ChatEngine: Send {
    /// Blocking execute path. Only a few requests support it.
    fn execute(&mut self, request: &EngineRequest) -> EngineResult<EngineObject>;

    /// Callback-based send path; the callback fires when the engine has a
    /// result, on an engine-owned thread.
    fn send(&mut self, request: &EngineRequest, on_result: SendCallback);
}

/// Creates the engine instance, wiring its event feed into a typed channel.
///
/// The factory replaces the engine's three callback registrations (update,
/// error, fatal) with a single `EngineSignal` channel.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        signals: mpsc::UnboundedSender<EngineSignal>,
    ) -> Result<Box<dyn ChatEngine>, GatewayError>;
}

/// A connection to the session's engine, local or remote.
///
/// This is the seam the event multiplexer and the authorization state
/// machine consume; they do not care which node owns the engine.
#[async_trait]
pub trait SessionConnection: Send + Sync {
    /// Execute one request. `execute_directly` selects the engine's blocking
    /// execute path instead of the callback-based send path.
    async fn execute(
        &self,
        request: EngineRequest,
        execute_directly: bool,
    ) -> Result<EngineResult<EngineObject>, GatewayError>;

    /// Subscribe to the engine event feed.
    async fn receive(&self) -> Result<EventStream, GatewayError>;
}
