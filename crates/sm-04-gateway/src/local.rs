//! Single-process session wiring.
//!
//! Pairs a served gateway with its own remote client over one cluster
//! handle, so callers exercise the full bus path without a second node.
//!
//! Serving and engine creation are separate steps: the session is served
//! first so event subscribers can attach, and the engine is initialized
//! afterwards. The engine's first life-cycle update is published only once
//! `initialize` runs, so nothing is emitted into a subscriber-less bus.

use crate::error::GatewayError;
use crate::gateway::ExecutionGateway;
use crate::ports::{EngineFactory, SessionConnection};
use crate::remote::{GatewayServer, RemoteGateway};
use crate::stream::EventStream;
use shared_types::{EngineObject, EngineRequest, EngineResult, HandleState};
use sm_03_cluster::ClusterHandle;
use std::sync::Arc;
use tracing::info;

/// A session served and consumed inside one process.
pub struct LocalSession {
    gateway: Arc<ExecutionGateway>,
    client: RemoteGateway,
    alias: String,
}

impl LocalSession {
    /// Serve a fresh gateway on the bus and connect a client to it.
    ///
    /// The engine does not exist yet; call [`LocalSession::initialize`]
    /// once event subscribers are attached.
    pub async fn start(
        cluster: Arc<ClusterHandle>,
        alias: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let alias = alias.into();
        let gateway = Arc::new(ExecutionGateway::new());

        let server = GatewayServer::new(cluster.clone(), gateway.clone(), alias.clone());
        server.start().await?;

        let client = RemoteGateway::new(cluster, alias.clone());
        info!(alias = %alias, "Local session served");
        Ok(Self {
            gateway,
            client,
            alias,
        })
    }

    /// Create the engine and move the served handle to `Present`.
    pub fn initialize(&self, factory: &dyn EngineFactory) -> Result<(), GatewayError> {
        self.gateway.initialize(factory)
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Current handle state on the served side.
    #[must_use]
    pub fn state(&self) -> HandleState {
        self.gateway.state()
    }

    /// Tear down the served side without waiting for the engine.
    pub fn destroy(&self) {
        self.gateway.destroy();
    }
}

#[async_trait::async_trait]
impl SessionConnection for LocalSession {
    async fn execute(
        &self,
        request: EngineRequest,
        execute_directly: bool,
    ) -> Result<EngineResult<EngineObject>, GatewayError> {
        self.client.execute(request, execute_directly).await
    }

    async fn receive(&self) -> Result<EventStream, GatewayError> {
        self.client.receive().await
    }
}
