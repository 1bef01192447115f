//! Reference-counted fan-out over one upstream event subscription.

use shared_types::{EngineUpdate, SignalEnvelope};
use sm_04_gateway::{GatewayError, SessionConnection};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const FANOUT_CAPACITY: usize = 1000;

struct Upstream {
    sender: broadcast::Sender<SignalEnvelope<EngineUpdate>>,
    pump: JoinHandle<()>,
    subscribers: usize,
}

struct Inner {
    upstream: Option<Upstream>,
    /// The terminal envelope, kept for replay to late subscribers.
    terminal: Option<SignalEnvelope<EngineUpdate>>,
}

struct Shared {
    state: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shares one upstream event subscription among many subscribers.
pub struct EventMultiplexer {
    connection: Arc<dyn SessionConnection>,
    shared: Arc<Shared>,
}

impl EventMultiplexer {
    #[must_use]
    pub fn new(connection: Arc<dyn SessionConnection>) -> Self {
        Self {
            connection,
            shared: Arc::new(Shared {
                state: Mutex::new(Inner {
                    upstream: None,
                    terminal: None,
                }),
            }),
        }
    }

    /// Subscribe to the fan-out.
    ///
    /// Opens the upstream on the first live subscription; replays the
    /// terminal envelope once the feed has ended.
    pub async fn subscribe(&self) -> Result<MuxStream, GatewayError> {
        {
            let mut inner = self.shared.lock();
            if let Some(terminal) = inner.terminal.clone() {
                debug!("Feed already terminal, replaying to late subscriber");
                return Ok(MuxStream::replay(terminal));
            }
            if let Some(upstream) = inner.upstream.as_mut() {
                upstream.subscribers += 1;
                let receiver = upstream.sender.subscribe();
                return Ok(MuxStream::live(receiver, self.shared.clone()));
            }
        }

        // No live upstream; open one without holding the lock.
        let mut events = self.connection.receive().await?;
        let mut inner = self.shared.lock();
        if let Some(terminal) = inner.terminal.clone() {
            return Ok(MuxStream::replay(terminal));
        }
        if let Some(upstream) = inner.upstream.as_mut() {
            // Another subscriber raced us; keep theirs, drop ours.
            upstream.subscribers += 1;
            let receiver = upstream.sender.subscribe();
            return Ok(MuxStream::live(receiver, self.shared.clone()));
        }

        let (sender, receiver) = broadcast::channel(FANOUT_CAPACITY);
        let shared = self.shared.clone();
        let fanout = sender.clone();
        let pump = tokio::spawn(async move {
            while let Some(envelope) = events.recv().await {
                let terminal = envelope.is_terminal();
                if terminal {
                    let mut inner = shared.lock();
                    inner.terminal = Some(envelope.clone());
                    inner.upstream = None;
                }
                let _ = fanout.send(envelope);
                if terminal {
                    debug!("Upstream feed terminated");
                    return;
                }
            }
            // Upstream ended without a terminal envelope; treat as complete.
            let mut inner = shared.lock();
            inner.terminal = Some(SignalEnvelope::Complete);
            inner.upstream = None;
            drop(inner);
            let _ = fanout.send(SignalEnvelope::Complete);
        });
        inner.upstream = Some(Upstream {
            sender,
            pump,
            subscribers: 1,
        });
        debug!("Upstream event feed opened");
        Ok(MuxStream::live(receiver, self.shared.clone()))
    }

    /// Number of live subscribers, zero once the feed is torn down.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .lock()
            .upstream
            .as_ref()
            .map_or(0, |upstream| upstream.subscribers)
    }
}

/// One subscriber's view of the fan-out.
pub struct MuxStream {
    receiver: Option<broadcast::Receiver<SignalEnvelope<EngineUpdate>>>,
    replay: Option<SignalEnvelope<EngineUpdate>>,
    shared: Option<Arc<Shared>>,
    done: bool,
}

impl MuxStream {
    fn live(
        receiver: broadcast::Receiver<SignalEnvelope<EngineUpdate>>,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            receiver: Some(receiver),
            replay: None,
            shared: Some(shared),
            done: false,
        }
    }

    fn replay(terminal: SignalEnvelope<EngineUpdate>) -> Self {
        Self {
            receiver: None,
            replay: Some(terminal),
            shared: None,
            done: false,
        }
    }

    /// Receive the next envelope; `None` once the feed is exhausted.
    pub async fn recv(&mut self) -> Option<SignalEnvelope<EngineUpdate>> {
        if self.done {
            return None;
        }
        if let Some(terminal) = self.replay.take() {
            self.done = true;
            return Some(terminal);
        }
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(envelope) => {
                    if envelope.is_terminal() {
                        self.done = true;
                    }
                    return Some(envelope);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.done = true;
                    return None;
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Fan-out subscriber lagged, updates dropped");
                }
            }
        }
    }
}

impl Drop for MuxStream {
    fn drop(&mut self) {
        let Some(shared) = self.shared.take() else {
            return;
        };
        let mut inner = shared.lock();
        if let Some(upstream) = inner.upstream.as_mut() {
            upstream.subscribers -= 1;
            if upstream.subscribers == 0 {
                debug!("Last subscriber gone, cancelling upstream feed");
                upstream.pump.abort();
                inner.upstream = None;
            }
        }
    }
}
