//! Event stream handed to gateway subscribers.
//!
//! Dropping the stream before the engine's closed life-cycle milestone is
//! observed is distinguished from a true engine-initiated close: the former
//! reports `CancelledBeforeClose`, the latter `ConfirmedClosed`.

use shared_types::{EngineUpdate, SignalEnvelope};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio_stream::Stream;
use tracing::warn;

/// How a `receive()` subscription ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveTermination {
    /// The engine reported its closed milestone before the stream ended.
    ConfirmedClosed,
    /// The subscriber cancelled before a close was confirmed.
    CancelledBeforeClose,
}

/// A stream of engine event envelopes.
pub struct EventStream {
    receiver: mpsc::Receiver<SignalEnvelope<EngineUpdate>>,
    closed_observed: Arc<AtomicBool>,
    termination: Option<watch::Sender<Option<ReceiveTermination>>>,
}

impl EventStream {
    pub(crate) fn new(
        receiver: mpsc::Receiver<SignalEnvelope<EngineUpdate>>,
        closed_observed: Arc<AtomicBool>,
        termination: Option<watch::Sender<Option<ReceiveTermination>>>,
    ) -> Self {
        Self {
            receiver,
            closed_observed,
            termination,
        }
    }

    /// A stream without termination reporting, fed from a plain channel.
    #[must_use]
    pub fn from_channel(receiver: mpsc::Receiver<SignalEnvelope<EngineUpdate>>) -> Self {
        Self {
            receiver,
            closed_observed: Arc::new(AtomicBool::new(false)),
            termination: None,
        }
    }

    /// Receive the next envelope; `None` once the feed is exhausted.
    pub async fn recv(&mut self) -> Option<SignalEnvelope<EngineUpdate>> {
        let envelope = self.receiver.recv().await;
        if matches!(envelope, Some(SignalEnvelope::Complete)) {
            self.closed_observed.store(true, Ordering::SeqCst);
        }
        envelope
    }
}

impl Stream for EventStream {
    type Item = SignalEnvelope<EngineUpdate>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.receiver.poll_recv(cx);
        if let Poll::Ready(Some(SignalEnvelope::Complete)) = polled {
            self.closed_observed.store(true, Ordering::SeqCst);
        }
        polled
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        let Some(termination) = self.termination.take() else {
            return;
        };
        let outcome = if self.closed_observed.load(Ordering::SeqCst) {
            ReceiveTermination::ConfirmedClosed
        } else {
            warn!("Event subscription cancelled before the engine confirmed close");
            ReceiveTermination::CancelledBeforeClose
        };
        let _ = termination.send(Some(outcome));
    }
}
