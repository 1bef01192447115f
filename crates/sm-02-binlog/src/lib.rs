//! # Session Binlog Store (sm-02)
//!
//! Owns the single durable log file per session (`<database_directory>/td.binlog`)
//! and reconciles divergent copies when session ownership moves between nodes.
//!
//! ## Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Single Writer | Only the node holding the engine handle mutates the binlog |
//! | 2 | Durable Writes | Every save is flushed to the device before returning |
//! | 3 | Local Wins Ties | Reconciliation keeps the local copy when timestamps are equal |
//! | 4 | Best-Effort Purge | Artifact cleanup never aborts the close sequence |
//!
//! The conflict-resolution rule is a single wall-clock comparison: no merge,
//! no versioning.

pub mod file;
pub mod purge;
pub mod reconcile;

pub use file::{BinlogError, BinlogFile};
pub use purge::{purge_session_artifacts, CLEANABLE_SUBDIRECTORIES};
pub use reconcile::reconcile;

/// File name of the durable session log inside the database directory.
pub const BINLOG_FILE_NAME: &str = "td.binlog";

/// Render a byte count with binary units, for logs.
#[must_use]
pub fn human_readable_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
