//! Address-scoped broadcast bus.
//!
//! Every address owns one broadcast channel created lazily on first use.
//! Frames carry the identifier of the process that published them so a
//! `local_only` subscription can filter out frames injected by a remote
//! ingress adapter.

use crate::error::ClusterError;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// One framed payload on the bus.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Identifier of the publishing process.
    pub origin: Uuid,
    /// Encoded envelope bytes.
    pub bytes: Vec<u8>,
}

/// The in-process half of the cluster event bus.
#[derive(Debug)]
pub(crate) struct EventBus {
    local_origin: Uuid,
    channels: RwLock<HashMap<String, broadcast::Sender<Frame>>>,
    capacity: usize,
}

impl EventBus {
    pub(crate) fn new(local_origin: Uuid) -> Self {
        Self {
            local_origin,
            channels: RwLock::new(HashMap::new()),
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    fn sender(&self, address: &str) -> broadcast::Sender<Frame> {
        if let Ok(channels) = self.channels.read() {
            if let Some(sender) = channels.get(address) {
                return sender.clone();
            }
        }
        let mut channels = match self.channels.write() {
            Ok(guard) => guard,
            // A poisoned lock means a panic elsewhere; recover the map anyway.
            Err(poisoned) => poisoned.into_inner(),
        };
        channels
            .entry(address.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Publish locally-originated bytes to `address`.
    pub(crate) fn publish(&self, address: &str, bytes: Vec<u8>) -> Result<usize, ClusterError> {
        self.dispatch(
            address,
            Frame {
                origin: self.local_origin,
                bytes,
            },
        )
    }

    /// Inject a frame arriving from a remote node.
    pub(crate) fn ingress(&self, address: &str, origin: Uuid, bytes: Vec<u8>) -> Result<usize, ClusterError> {
        self.dispatch(address, Frame { origin, bytes })
    }

    fn dispatch(&self, address: &str, frame: Frame) -> Result<usize, ClusterError> {
        let sender = self.sender(address);
        match sender.send(frame) {
            Ok(receivers) => {
                debug!(address, receivers, "Frame published");
                Ok(receivers)
            }
            Err(_) => {
                warn!(address, "Frame dropped (no subscribers)");
                Err(ClusterError::NoSubscribers {
                    address: address.to_string(),
                })
            }
        }
    }

    pub(crate) fn subscribe(self: &Arc<Self>, address: &str, local_only: bool) -> Subscription {
        let receiver = self.sender(address).subscribe();
        debug!(address, local_only, "New bus subscription");
        Subscription {
            receiver,
            address: address.to_string(),
            local_only,
            local_origin: self.local_origin,
        }
    }
}

/// A subscription handle for receiving frames at one address.
pub struct Subscription {
    receiver: broadcast::Receiver<Frame>,
    address: String,
    local_only: bool,
    local_origin: Uuid,
}

impl Subscription {
    /// Receive the next frame, skipping remote-origin frames when the
    /// subscription is local-only.
    ///
    /// Returns `None` when the bus side of the channel is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        loop {
            let frame = match self.receiver.recv().await {
                Ok(frame) => frame,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(address = %self.address, lagged = count, "Subscriber lagged, frames dropped");
                    continue;
                }
            };
            if self.local_only && frame.origin != self.local_origin {
                continue;
            }
            return Some(frame);
        }
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}
