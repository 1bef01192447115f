//! Cluster join configuration.
//!
//! Mirrors the fixed deployment shape: static TCP members, one bind port
//! with auto-increment disabled, mutual TLS, one replicated bookkeeping map
//! (no TTL, no eviction, single backup, last-write-wins merge) and one
//! cluster-wide binary semaphore class with a single permit.

use crate::error::ClusterError;
use crate::CONNECT_TIMEOUT_MS;
use std::path::PathBuf;
use std::time::Duration;

/// Minimum TLS protocol versions accepted on cluster channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

/// Key or trust store location plus its password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub path: PathBuf,
    pub password: String,
}

/// Mutual-TLS settings for the replicated-state channel.
///
/// The byte-moving TLS implementation is an external transport collaborator;
/// this bundle is validated here and handed to it at formation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub keystore: StorePaths,
    pub truststore: StorePaths,
    /// Fixed minimum protocol set; both versions are always enabled.
    pub min_protocol_versions: [TlsVersion; 2],
    /// Client authentication is always required on cluster channels.
    pub client_auth_required: bool,
    pub handshake_timeout: Duration,
}

impl TlsConfig {
    #[must_use]
    pub fn new(keystore: StorePaths, truststore: StorePaths) -> Self {
        Self {
            keystore,
            truststore,
            min_protocol_versions: [TlsVersion::Tls12, TlsVersion::Tls13],
            client_auth_required: true,
            handshake_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
        }
    }
}

/// Merge policy for the replicated bookkeeping map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMergePolicy {
    LastWriteWins,
}

/// Replicated bookkeeping map settings. Used only for address/subscription
/// bookkeeping: no TTL, no eviction, one backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionMapConfig {
    pub name: String,
    pub backup_count: u32,
    pub time_to_live: Option<Duration>,
    pub eviction: bool,
    pub merge_policy: MapMergePolicy,
}

impl Default for SubscriptionMapConfig {
    fn default() -> Self {
        Self {
            name: "__subs".to_string(),
            backup_count: 1,
            time_to_live: None,
            eviction: false,
            merge_policy: MapMergePolicy::LastWriteWins,
        }
    }
}

/// Cluster-wide binary semaphore resource class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreConfig {
    pub name_pattern: String,
    pub permits: u32,
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self {
            name_pattern: "__cluster.*".to_string(),
            permits: 1,
        }
    }
}

/// Full per-node join configuration.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub instance_name: String,
    pub bind_interface: String,
    /// Fixed port; auto-increment is disabled.
    pub port: u16,
    /// Static TCP member list. No multicast, no cloud discovery.
    pub members: Vec<String>,
    pub connect_timeout: Duration,
    pub tls: TlsConfig,
    pub subscription_map: SubscriptionMapConfig,
    pub semaphore: SemaphoreConfig,
}

impl ClusterConfig {
    pub(crate) fn validate(&self) -> Result<(), ClusterError> {
        if self.bind_interface.is_empty() {
            return Err(ClusterError::InvalidConfig {
                reason: "bind interface must not be empty".to_string(),
            });
        }
        if self.port == 0 {
            return Err(ClusterError::InvalidConfig {
                reason: "port 0 is not allowed, auto-increment is disabled".to_string(),
            });
        }
        if self.members.is_empty() {
            return Err(ClusterError::InvalidConfig {
                reason: "static member list must not be empty".to_string(),
            });
        }
        if !self.tls.client_auth_required {
            return Err(ClusterError::InvalidConfig {
                reason: "client authentication is mandatory on cluster channels".to_string(),
            });
        }
        Ok(())
    }
}
