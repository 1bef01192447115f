//! Broadcast feed subscriptions for the machine's output streams.

use tokio::sync::broadcast;
use tracing::warn;

/// A subscription to one of the machine's broadcast feeds (updates, errors,
/// fatal errors). Lagged slots are skipped with a warning.
pub struct FeedSubscription<T: Clone> {
    receiver: broadcast::Receiver<T>,
    name: &'static str,
}

impl<T: Clone> FeedSubscription<T> {
    pub(crate) fn new(receiver: broadcast::Receiver<T>, name: &'static str) -> Self {
        Self { receiver, name }
    }

    /// Receive the next item; `None` once the feed is closed.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(item) => return Some(item),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(feed = self.name, lagged = count, "Feed subscriber lagged, items dropped");
                }
            }
        }
    }
}
