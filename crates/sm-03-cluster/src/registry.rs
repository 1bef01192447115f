//! Codec registry.
//!
//! Registration is idempotent: concurrent start-up races registering the
//! same codec name are expected, so a duplicate registration reports `false`
//! instead of failing.

use std::collections::HashSet;
use std::sync::RwLock;
use tracing::debug;

/// Names of codecs registered with the cluster transport.
#[derive(Debug, Default)]
pub struct CodecRegistry {
    names: RwLock<HashSet<String>>,
}

impl CodecRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec name.
    ///
    /// Returns `true` if newly registered, `false` if a codec with this name
    /// was already present.
    pub fn register(&self, name: &str) -> bool {
        let mut names = match self.names.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let inserted = names.insert(name.to_string());
        if inserted {
            debug!(codec = name, "Codec registered");
        }
        inserted
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.names
            .read()
            .map(|names| names.contains(name))
            .unwrap_or(false)
    }
}
