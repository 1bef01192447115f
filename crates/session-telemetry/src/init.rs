//! Subscriber installation.

use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Errors from telemetry initialization.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level filter is not a valid directive set.
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter { filter: String, reason: String },
}

/// Keeps the installed subscriber's identity; held for the process lifetime.
pub struct TelemetryGuard {
    service_name: String,
}

impl TelemetryGuard {
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Install the global tracing subscriber.
///
/// A second initialization in the same process keeps the first subscriber
/// and succeeds anyway, so tests can call this freely.
pub fn init_tracing(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::InvalidFilter {
        filter: config.log_level.clone(),
        reason: e.to_string(),
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let already_installed = if config.json_logs {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
            .is_err()
    } else {
        registry.with(fmt::layer()).try_init().is_err()
    };

    if already_installed {
        tracing::debug!(service = %config.service_name, "Tracing already initialized, keeping the existing subscriber");
    } else {
        tracing::info!(
            service = %config.service_name,
            level = %config.log_level,
            json = config.json_logs,
            "Tracing initialized"
        );
    }
    Ok(TelemetryGuard {
        service_name: config.service_name.clone(),
    })
}
