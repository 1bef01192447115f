//! The execution gateway.
//!
//! Owns the single live engine handle and its lifecycle. Requests wait a
//! bounded time for the handle to appear; once destroyed the handle never
//! comes back, and only a close request is still accepted (trivially).

use crate::actor::EngineHandle;
use crate::error::GatewayError;
use crate::ports::{EngineFactory, SessionConnection};
use crate::stream::{EventStream, ReceiveTermination};
use crate::HANDLE_WAIT_TIMEOUT;
use async_trait::async_trait;
use shared_types::{
    AuthorizationState, EngineObject, EngineRequest, EngineResult, EngineSignal, EngineUpdate,
    HandleState, SignalEnvelope,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Log verbosity pushed to the engine right after creation, before any
/// caller-issued request.
const INITIAL_LOG_VERBOSITY: i32 = 1;

/// The single point of entry for requests against this node's engine.
pub struct ExecutionGateway {
    state_tx: watch::Sender<HandleState>,
    state_rx: watch::Receiver<HandleState>,
    engine: Mutex<Option<EngineHandle>>,
    events: broadcast::Sender<SignalEnvelope<EngineUpdate>>,
    termination_tx: watch::Sender<Option<ReceiveTermination>>,
    termination_rx: watch::Receiver<Option<ReceiveTermination>>,
}

impl ExecutionGateway {
    #[must_use]
    pub fn new() -> Self {
        let (state_tx, state_rx) = watch::channel(HandleState::Absent);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (termination_tx, termination_rx) = watch::channel(None);
        Self {
            state_tx,
            state_rx,
            engine: Mutex::new(None),
            events,
            termination_tx,
            termination_rx,
        }
    }

    /// Create the engine through `factory` and move the handle to `Present`.
    ///
    /// Fails with `AlreadyInitialized` when a handle already exists or
    /// existed; a destroyed gateway is never re-initialized. The event pump
    /// runs on the ambient tokio runtime, so calling this outside one fails
    /// with `NoRuntime` before any engine is created.
    pub fn initialize(&self, factory: &dyn EngineFactory) -> Result<(), GatewayError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| GatewayError::NoRuntime)?;
        {
            let state = *self.state_rx.borrow();
            if state != HandleState::Absent {
                return Err(GatewayError::AlreadyInitialized);
            }
        }

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let engine = factory.create(signal_tx)?;
        let handle = EngineHandle::spawn(engine);

        // Quiet the engine's native logging before anything else reaches it.
        handle.dispatch_and_forget(EngineRequest::SetLogVerbosityLevel(INITIAL_LOG_VERBOSITY));

        {
            let mut slot = self.engine.lock().unwrap_or_else(|e| e.into_inner());
            *slot = Some(handle);
        }
        let _ = self.state_tx.send(HandleState::Present);
        info!("Engine handle present");

        self.spawn_pump(&runtime, signal_rx);
        Ok(())
    }

    /// Forward the engine's signal feed into the broadcast event channel,
    /// destroying the handle when the closed milestone arrives.
    fn spawn_pump(
        &self,
        runtime: &tokio::runtime::Handle,
        mut signals: mpsc::UnboundedReceiver<EngineSignal>,
    ) {
        let events = self.events.clone();
        let state_tx = self.state_tx.clone();
        runtime.spawn(async move {
            while let Some(signal) = signals.recv().await {
                match signal {
                    EngineSignal::Update(update) => {
                        let closed = matches!(
                            update,
                            EngineUpdate::AuthorizationState(AuthorizationState::Closed)
                        );
                        let _ = events.send(SignalEnvelope::Item(update));
                        if closed {
                            debug!("Closed authorization state observed on event feed");
                        }
                    }
                    EngineSignal::EngineError(engine_error) => {
                        let _ = events.send(SignalEnvelope::Item(EngineUpdate::Error(engine_error)));
                    }
                    EngineSignal::FatalError(message) => {
                        error!(%message, "Fatal engine error");
                        let _ = events.send(SignalEnvelope::Error(message));
                    }
                    EngineSignal::ClosedMilestone => {
                        info!("Engine reached its closed milestone");
                        let _ = state_tx.send(HandleState::Destroyed);
                        let _ = events.send(SignalEnvelope::Complete);
                        break;
                    }
                }
            }
            debug!("Event pump stopped");
        });
    }

    /// Tear the handle down without waiting for the engine.
    ///
    /// Emits a terminal `Complete` so subscribers observe the end of the
    /// feed even when the engine never confirmed its close.
    pub fn destroy(&self) {
        let was_destroyed = *self.state_rx.borrow() == HandleState::Destroyed;
        let _ = self.state_tx.send(HandleState::Destroyed);
        if !was_destroyed {
            warn!("Engine handle destroyed by caller");
            let _ = self.events.send(SignalEnvelope::Complete);
        }
        let mut slot = self.engine.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Current handle state.
    #[must_use]
    pub fn state(&self) -> HandleState {
        *self.state_rx.borrow()
    }

    /// Observe how the last `receive()` subscription ended.
    #[must_use]
    pub fn termination(&self) -> Option<ReceiveTermination> {
        *self.termination_rx.borrow()
    }

    /// Wait a bounded time for the handle to leave `Absent`.
    async fn wait_for_handle(&self) -> Result<HandleState, GatewayError> {
        let mut state_rx = self.state_rx.clone();
        timeout(HANDLE_WAIT_TIMEOUT, async move {
            loop {
                let state = *state_rx.borrow_and_update();
                if state != HandleState::Absent {
                    return Ok(state);
                }
                if state_rx.changed().await.is_err() {
                    return Err(GatewayError::ChannelClosed);
                }
            }
        })
        .await
        .map_err(|_| GatewayError::Timeout)?
    }

    fn engine_handle(&self) -> Result<EngineHandle, GatewayError> {
        let slot = self.engine.lock().unwrap_or_else(|e| e.into_inner());
        slot.clone().ok_or(GatewayError::EngineUnavailable)
    }
}

impl Default for ExecutionGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionConnection for ExecutionGateway {
    async fn execute(
        &self,
        request: EngineRequest,
        execute_directly: bool,
    ) -> Result<EngineResult<EngineObject>, GatewayError> {
        match self.wait_for_handle().await? {
            HandleState::Present => {}
            HandleState::Destroyed => {
                // A close after destruction is already satisfied.
                if request.is_close() {
                    return Ok(EngineResult::Ok(EngineObject::Ok));
                }
                return Err(GatewayError::EngineUnavailable);
            }
            HandleState::Absent => unreachable!("wait_for_handle never returns Absent"),
        }
        let handle = self.engine_handle()?;
        handle.dispatch(request, execute_directly).await
    }

    async fn receive(&self) -> Result<EventStream, GatewayError> {
        let mut events = self.events.subscribe();
        // The broadcast channel keeps no history: a subscriber attaching
        // after the terminal envelope was emitted would park forever, so a
        // destroyed handle gets the completion replayed here. The state is
        // checked after subscribing; a destroy racing this call lands either
        // in the replay branch or in the live subscription.
        if *self.state_rx.borrow() == HandleState::Destroyed {
            let (tx, rx) = mpsc::channel(1);
            let _ = tx.try_send(SignalEnvelope::Complete);
            return Ok(EventStream::new(
                rx,
                Arc::new(AtomicBool::new(false)),
                Some(self.termination_tx.clone()),
            ));
        }
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(envelope) => {
                        let terminal = envelope.is_terminal();
                        if tx.send(envelope).await.is_err() {
                            break;
                        }
                        if terminal {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!(lagged = count, "Event subscriber lagged, updates dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(EventStream::new(
            rx,
            Arc::new(AtomicBool::new(false)),
            Some(self.termination_tx.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{ChatEngine, SendCallback};
    use std::time::Duration;

    struct EchoEngine;

    impl ChatEngine for EchoEngine {
        fn execute(&mut self, _request: &EngineRequest) -> EngineResult<EngineObject> {
            EngineResult::Ok(EngineObject::Ok)
        }

        fn send(&mut self, _request: &EngineRequest, on_result: SendCallback) {
            on_result(EngineResult::Ok(EngineObject::Ok));
        }
    }

    struct EchoFactory;

    impl EngineFactory for EchoFactory {
        fn create(
            &self,
            _signals: mpsc::UnboundedSender<EngineSignal>,
        ) -> Result<Box<dyn ChatEngine>, GatewayError> {
            Ok(Box::new(EchoEngine))
        }
    }

    struct SignalingFactory;

    impl EngineFactory for SignalingFactory {
        fn create(
            &self,
            signals: mpsc::UnboundedSender<EngineSignal>,
        ) -> Result<Box<dyn ChatEngine>, GatewayError> {
            signals
                .send(EngineSignal::Update(EngineUpdate::AuthorizationState(
                    AuthorizationState::WaitPhoneNumber,
                )))
                .ok();
            signals.send(EngineSignal::ClosedMilestone).ok();
            Ok(Box::new(EchoEngine))
        }
    }

    #[tokio::test]
    async fn test_initialize_once() {
        let gateway = ExecutionGateway::new();
        gateway.initialize(&EchoFactory).unwrap();
        assert_eq!(gateway.state(), HandleState::Present);

        let err = gateway.initialize(&EchoFactory).unwrap_err();
        assert!(matches!(err, GatewayError::AlreadyInitialized));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_times_out_while_absent() {
        let gateway = ExecutionGateway::new();
        let err = gateway
            .execute(EngineRequest::GetOption { name: "version".into() }, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Timeout));
    }

    #[tokio::test]
    async fn test_execute_waits_for_late_initialize() {
        let gateway = Arc::new(ExecutionGateway::new());
        let waiting = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.execute(EngineRequest::Close, false).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        gateway.initialize(&EchoFactory).unwrap();

        let result = waiting.await.unwrap().unwrap();
        assert_eq!(result, EngineResult::Ok(EngineObject::Ok));
    }

    #[tokio::test]
    async fn test_destroyed_rejects_all_but_close() {
        let gateway = ExecutionGateway::new();
        gateway.initialize(&EchoFactory).unwrap();
        gateway.destroy();
        assert_eq!(gateway.state(), HandleState::Destroyed);

        let closed = gateway.execute(EngineRequest::Close, false).await.unwrap();
        assert_eq!(closed, EngineResult::Ok(EngineObject::Ok));

        let err = gateway
            .execute(EngineRequest::SetLogVerbosityLevel(0), false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::EngineUnavailable));
    }

    #[test]
    fn test_initialize_outside_runtime_is_an_error() {
        let gateway = ExecutionGateway::new();
        let err = gateway.initialize(&EchoFactory).unwrap_err();
        assert!(matches!(err, GatewayError::NoRuntime));
        assert_eq!(gateway.state(), HandleState::Absent);
    }

    #[tokio::test]
    async fn test_late_subscriber_observes_completion() {
        let gateway = ExecutionGateway::new();
        gateway.initialize(&SignalingFactory).unwrap();
        while gateway.state() != HandleState::Destroyed {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // No subscription existed while the feed ran; the terminal envelope
        // is replayed instead of leaving the stream parked.
        let mut stream = gateway.receive().await.unwrap();
        let envelope = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .expect("completion replayed for a late subscriber")
            .unwrap();
        assert!(envelope.is_complete());
    }

    #[tokio::test]
    async fn test_late_subscriber_after_destroy_observes_completion() {
        let gateway = ExecutionGateway::new();
        gateway.initialize(&EchoFactory).unwrap();
        gateway.destroy();

        let mut stream = gateway.receive().await.unwrap();
        let envelope = tokio::time::timeout(Duration::from_secs(2), stream.recv())
            .await
            .expect("completion replayed after destroy")
            .unwrap();
        assert!(envelope.is_complete());
    }

    #[tokio::test]
    async fn test_closed_milestone_completes_feed_and_destroys() {
        let gateway = ExecutionGateway::new();
        let mut stream = gateway.receive().await.unwrap();
        gateway.initialize(&SignalingFactory).unwrap();

        let first = stream.recv().await.unwrap();
        assert_eq!(
            first,
            SignalEnvelope::Item(EngineUpdate::AuthorizationState(
                AuthorizationState::WaitPhoneNumber
            ))
        );
        assert!(stream.recv().await.unwrap().is_complete());
        drop(stream);

        assert_eq!(gateway.state(), HandleState::Destroyed);
        assert_eq!(gateway.termination(), Some(ReceiveTermination::ConfirmedClosed));
    }
}
