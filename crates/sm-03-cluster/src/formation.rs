//! Cluster formation.
//!
//! `form_master` and `form_worker` each guard a one-shot per-process flag:
//! the first formation attempt of a role claims it, every later attempt
//! fails with `AlreadyFormed` regardless of arguments. The flags are never
//! reset.

use crate::bus::{EventBus, Frame, Subscription};
use crate::config::{ClusterConfig, SemaphoreConfig, SubscriptionMapConfig, TlsConfig};
use crate::error::ClusterError;
use crate::registry::CodecRegistry;
use crate::CONNECT_TIMEOUT_MS;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

static MASTER_FORMED: AtomicBool = AtomicBool::new(false);
static WORKER_FORMED: AtomicBool = AtomicBool::new(false);

/// Role of this node in the cluster. Fixed at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Master,
    Worker,
}

impl NodeRole {
    fn guard(self) -> &'static AtomicBool {
        match self {
            NodeRole::Master => &MASTER_FORMED,
            NodeRole::Worker => &WORKER_FORMED,
        }
    }

    fn name(self) -> &'static str {
        match self {
            NodeRole::Master => "master",
            NodeRole::Worker => "worker",
        }
    }
}

/// Form the master side of the cluster.
///
/// `local_only` skips networked membership entirely and runs a
/// process-local bus, trading distribution for single-process operation.
pub fn form_master(
    tls: TlsConfig,
    bind_interface: impl Into<String>,
    port: u16,
    worker_addresses: Vec<String>,
    local_only: bool,
) -> Result<ClusterHandle, ClusterError> {
    form(NodeRole::Master, tls, bind_interface.into(), port, worker_addresses, local_only)
}

/// Form the worker side of the cluster. Symmetric one-shot guard.
pub fn form_worker(
    tls: TlsConfig,
    bind_interface: impl Into<String>,
    port: u16,
    known_addresses: Vec<String>,
    local_only: bool,
) -> Result<ClusterHandle, ClusterError> {
    form(NodeRole::Worker, tls, bind_interface.into(), port, known_addresses, local_only)
}

fn form(
    role: NodeRole,
    tls: TlsConfig,
    bind_interface: String,
    port: u16,
    members: Vec<String>,
    local_only: bool,
) -> Result<ClusterHandle, ClusterError> {
    if role
        .guard()
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(ClusterError::AlreadyFormed { role: role.name() });
    }

    let instance_name = match role {
        NodeRole::Master => "Master".to_string(),
        NodeRole::Worker => format!("Node-{}", Uuid::new_v4()),
    };

    let config = if local_only {
        None
    } else {
        let config = ClusterConfig {
            instance_name: instance_name.clone(),
            bind_interface,
            port,
            members,
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
            tls,
            subscription_map: SubscriptionMapConfig::default(),
            semaphore: SemaphoreConfig::default(),
        };
        config.validate()?;
        Some(config)
    };

    info!(
        role = role.name(),
        instance = %instance_name,
        local_only,
        "Cluster formed"
    );

    Ok(ClusterHandle {
        role,
        instance_name,
        config,
        bus: Arc::new(EventBus::new(Uuid::new_v4())),
        codecs: Arc::new(CodecRegistry::new()),
    })
}

/// Reset the formation guards. Test-only: production code never resets them.
#[doc(hidden)]
pub fn reset_formation_guards_for_tests() {
    MASTER_FORMED.store(false, Ordering::SeqCst);
    WORKER_FORMED.store(false, Ordering::SeqCst);
}

/// A formed cluster membership plus its messaging surface.
#[derive(Debug)]
pub struct ClusterHandle {
    role: NodeRole,
    instance_name: String,
    /// `None` in local-only mode.
    config: Option<ClusterConfig>,
    bus: Arc<EventBus>,
    codecs: Arc<CodecRegistry>,
}

impl ClusterHandle {
    #[must_use]
    pub fn role(&self) -> NodeRole {
        self.role
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    #[must_use]
    pub fn is_local_only(&self) -> bool {
        self.config.is_none()
    }

    #[must_use]
    pub fn config(&self) -> Option<&ClusterConfig> {
        self.config.as_ref()
    }

    /// Publish encoded envelope bytes to an address.
    ///
    /// Returns the number of subscribers the frame reached. Delivery errors
    /// surface to the caller; this layer does not retry.
    pub fn publish(&self, address: &str, bytes: Vec<u8>) -> Result<usize, ClusterError> {
        self.bus.publish(address, bytes)
    }

    /// Subscribe to frames at an address.
    ///
    /// `local_only = true` restricts delivery to frames published within
    /// this process.
    #[must_use]
    pub fn subscribe(&self, address: &str, local_only: bool) -> Subscription {
        self.bus.subscribe(address, local_only)
    }

    /// Inject a frame that arrived from a remote node. Used by the remote
    /// transport ingress adapter.
    pub fn ingress(&self, address: &str, origin: Uuid, bytes: Vec<u8>) -> Result<usize, ClusterError> {
        self.bus.ingress(address, origin, bytes)
    }

    /// Register a codec name with the transport.
    ///
    /// Returns `false` (not an error) when the name is already registered;
    /// idempotent registration is expected under concurrent start-up races.
    pub fn register_codec(&self, name: &str) -> bool {
        self.codecs.register(name)
    }

    #[must_use]
    pub fn codec_registered(&self, name: &str) -> bool {
        self.codecs.is_registered(name)
    }
}
