//! Session artifact cleanup.
//!
//! On graceful shutdown the session directory is stripped of regenerable
//! engine artifacts. The binlog itself is never touched. Cleanup is
//! best-effort: a subdirectory that cannot be deleted is logged and skipped,
//! never failing the close sequence.

use std::fs;
use std::path::Path;
use tracing::{debug, error};

/// The fixed set of cleanable subdirectories inside a session directory.
pub const CLEANABLE_SUBDIRECTORIES: [&str; 7] = [
    "media",
    "passport",
    "profile_photos",
    "stickers",
    "temp",
    "thumbnails",
    "wallpapers",
];

/// Recursively delete the cleanable subdirectories of `session_dir`.
///
/// Returns the number of subdirectories actually removed.
pub fn purge_session_artifacts(session_dir: impl AsRef<Path>) -> usize {
    let session_dir = session_dir.as_ref();
    let mut removed = 0usize;
    for name in CLEANABLE_SUBDIRECTORIES {
        let dir = session_dir.join(name);
        if !dir.exists() {
            continue;
        }
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(path = %dir.display(), "Deleted session artifact directory");
                removed += 1;
            }
            Err(e) => {
                error!(path = %dir.display(), error = %e, "Can't delete session artifact directory");
            }
        }
    }
    removed
}
