//! Remote gateway routing.
//!
//! `GatewayServer` exposes a session connection on the cluster bus;
//! `RemoteGateway` is the node-agnostic client side. Execute exchanges are
//! correlated through per-request reply addresses; the event feed is
//! republished on a broadcast address any node can subscribe to.

use crate::error::GatewayError;
use crate::ports::SessionConnection;
use crate::stream::EventStream;
use crate::DELIVERY_TIMEOUT;
use shared_types::{EngineObject, EngineRequest, EngineResult, ExecuteEnvelope};
use sm_01_wire::{update_signal_codec, ExecuteCodec, ResultCodec, WireError};
use sm_03_cluster::ClusterHandle;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Point-to-point execute address for a session alias.
#[must_use]
pub fn session_execute_address(alias: &str) -> String {
    format!("{alias}.execute")
}

/// Broadcast event address for a session alias.
#[must_use]
pub fn session_events_address(alias: &str) -> String {
    format!("{alias}.events")
}

fn reply_address(alias: &str, correlation: Uuid) -> String {
    format!("{alias}.execute.reply.{correlation}")
}

fn events_replay_address(alias: &str) -> String {
    format!("{alias}.events.replay")
}

fn events_replay_reply_address(alias: &str, correlation: Uuid) -> String {
    format!("{alias}.events.replay.reply.{correlation}")
}

const CORRELATION_LEN: usize = 16;

fn encode_correlated(correlation: Uuid, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(CORRELATION_LEN + payload.len());
    bytes.extend_from_slice(correlation.as_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

fn split_correlated(bytes: &[u8]) -> Result<(Uuid, &[u8]), WireError> {
    if bytes.len() < CORRELATION_LEN {
        return Err(WireError::Truncated {
            offset: 0,
            needed: CORRELATION_LEN,
            available: bytes.len(),
        });
    }
    let mut raw = [0u8; CORRELATION_LEN];
    raw.copy_from_slice(&bytes[..CORRELATION_LEN]);
    Ok((Uuid::from_bytes(raw), &bytes[CORRELATION_LEN..]))
}

/// Serves one session connection on the cluster bus.
pub struct GatewayServer {
    cluster: Arc<ClusterHandle>,
    connection: Arc<dyn SessionConnection>,
    alias: String,
}

impl GatewayServer {
    #[must_use]
    pub fn new(
        cluster: Arc<ClusterHandle>,
        connection: Arc<dyn SessionConnection>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            cluster,
            connection,
            alias: alias.into(),
        }
    }

    /// Register codecs and start serving execute requests and the event feed.
    pub async fn start(&self) -> Result<(), GatewayError> {
        self.cluster.register_codec(ExecuteCodec::new().name());
        self.cluster.register_codec(ResultCodec::new().name());
        self.cluster.register_codec(update_signal_codec().name());

        let (terminal_tx, terminal_rx) = watch::channel(None);
        self.spawn_execute_loop();
        self.spawn_replay_loop(terminal_rx);
        self.spawn_event_republisher(terminal_tx).await?;
        info!(alias = %self.alias, "Gateway served on the bus");
        Ok(())
    }

    /// Answer completion-replay requests from event subscribers that attach
    /// after the feed has ended. The events address is a plain broadcast with
    /// no history, so the served side keeps the encoded terminal envelope and
    /// replays it to anyone who asks.
    fn spawn_replay_loop(&self, mut terminal: watch::Receiver<Option<Vec<u8>>>) {
        let mut requests = self
            .cluster
            .subscribe(&events_replay_address(&self.alias), false);
        let cluster = self.cluster.clone();
        let alias = self.alias.clone();
        tokio::spawn(async move {
            while let Some(frame) = requests.recv().await {
                let (correlation, _) = match split_correlated(&frame.bytes) {
                    Ok(parts) => parts,
                    Err(error) => {
                        warn!(%error, "Malformed replay request dropped");
                        continue;
                    }
                };
                // Requests arriving before completion are held until the
                // terminal envelope exists.
                while terminal.borrow().is_none() {
                    if terminal.changed().await.is_err() {
                        return;
                    }
                }
                let bytes = match terminal.borrow().clone() {
                    Some(bytes) => bytes,
                    None => continue,
                };
                if cluster
                    .publish(&events_replay_reply_address(&alias, correlation), bytes)
                    .is_err()
                {
                    debug!(%correlation, "Replay requester gone");
                }
            }
        });
    }

    fn spawn_execute_loop(&self) {
        let mut requests = self
            .cluster
            .subscribe(&session_execute_address(&self.alias), false);
        let cluster = self.cluster.clone();
        let connection = self.connection.clone();
        let alias = self.alias.clone();
        tokio::spawn(async move {
            let execute_codec = ExecuteCodec::new();
            let result_codec = ResultCodec::new();
            while let Some(frame) = requests.recv().await {
                let (correlation, payload) = match split_correlated(&frame.bytes) {
                    Ok(parts) => parts,
                    Err(error) => {
                        warn!(%error, "Malformed execute frame dropped");
                        continue;
                    }
                };
                let envelope = match execute_codec.decode(payload, 0) {
                    Ok((envelope, _)) => envelope,
                    Err(error) => {
                        warn!(%error, "Undecodable execute envelope dropped");
                        continue;
                    }
                };
                debug!(alias = %alias, %correlation, "Serving execute request");
                let result = match connection
                    .execute(envelope.request, envelope.execute_directly)
                    .await
                {
                    Ok(result) => result,
                    Err(error) => EngineResult::err(500, error.to_string()),
                };
                let mut reply = Vec::new();
                if let Err(error) = result_codec.encode(&result, &mut reply) {
                    warn!(%error, "Result encoding failed");
                    continue;
                }
                if cluster
                    .publish(&reply_address(&alias, correlation), reply)
                    .is_err()
                {
                    warn!(%correlation, "Requester gone before reply");
                }
            }
        });
    }

    async fn spawn_event_republisher(
        &self,
        terminal_tx: watch::Sender<Option<Vec<u8>>>,
    ) -> Result<(), GatewayError> {
        let mut stream = self.connection.receive().await?;
        let cluster = self.cluster.clone();
        let address = session_events_address(&self.alias);
        tokio::spawn(async move {
            let codec = update_signal_codec();
            while let Some(envelope) = stream.recv().await {
                let terminal = envelope.is_terminal();
                let mut bytes = Vec::new();
                if let Err(error) = codec.encode(&envelope, &mut bytes) {
                    warn!(%error, "Event encoding failed");
                    continue;
                }
                if terminal {
                    let _ = terminal_tx.send(Some(bytes.clone()));
                }
                // No subscribers yet is fine for a broadcast feed.
                let _ = cluster.publish(&address, bytes);
                if terminal {
                    break;
                }
            }
            debug!(address, "Event republisher stopped");
        });
        Ok(())
    }
}

/// Client side of a served gateway, usable from any cluster node.
pub struct RemoteGateway {
    cluster: Arc<ClusterHandle>,
    alias: String,
}

impl RemoteGateway {
    #[must_use]
    pub fn new(cluster: Arc<ClusterHandle>, alias: impl Into<String>) -> Self {
        Self {
            cluster,
            alias: alias.into(),
        }
    }
}

#[async_trait::async_trait]
impl SessionConnection for RemoteGateway {
    async fn execute(
        &self,
        request: EngineRequest,
        execute_directly: bool,
    ) -> Result<EngineResult<EngineObject>, GatewayError> {
        let correlation = Uuid::new_v4();
        // Subscribe before publishing so the reply cannot be missed.
        let mut replies = self
            .cluster
            .subscribe(&reply_address(&self.alias, correlation), false);

        let envelope = ExecuteEnvelope::new(execute_directly, request);
        let mut payload = Vec::new();
        ExecuteCodec::new().encode(&envelope, &mut payload)?;
        self.cluster.publish(
            &session_execute_address(&self.alias),
            encode_correlated(correlation, &payload),
        )?;

        let frame = timeout(DELIVERY_TIMEOUT, replies.recv())
            .await
            .map_err(|_| GatewayError::Timeout)?
            .ok_or(GatewayError::ChannelClosed)?;
        let (result, _) = ResultCodec::new().decode(&frame.bytes, 0)?;
        Ok(result)
    }

    async fn receive(&self) -> Result<EventStream, GatewayError> {
        let mut frames = self
            .cluster
            .subscribe(&session_events_address(&self.alias), false);

        // Ask the served side to replay the terminal envelope in case the
        // feed completed before this subscription existed. A server that has
        // not completed holds the request; one that is not serving at all
        // leaves the publish undelivered, which is fine for a live feed.
        let correlation = Uuid::new_v4();
        let mut replays = self
            .cluster
            .subscribe(&events_replay_reply_address(&self.alias, correlation), false);
        let _ = self.cluster.publish(
            &events_replay_address(&self.alias),
            correlation.as_bytes().to_vec(),
        );

        let (tx, rx) = mpsc::channel(sm_03_cluster::DEFAULT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let codec = update_signal_codec();
            loop {
                let frame = tokio::select! {
                    frame = frames.recv() => frame,
                    frame = replays.recv() => frame,
                };
                let Some(frame) = frame else { break };
                let envelope = match codec.decode(&frame.bytes, 0) {
                    Ok((envelope, _)) => envelope,
                    Err(error) => {
                        warn!(%error, "Undecodable event envelope dropped");
                        continue;
                    }
                };
                let terminal = envelope.is_terminal();
                if tx.send(envelope).await.is_err() || terminal {
                    break;
                }
            }
        });
        Ok(EventStream::from_channel(rx))
    }
}
