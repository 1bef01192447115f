//! Ownership-migration reconciliation.
//!
//! When a node takes ownership of a session it compares its local binlog
//! against the copy shipped by the previous owner. The rule is a single
//! wall-clock comparison: the local file wins when its last-modified
//! timestamp is greater than or equal to the remote one, otherwise the
//! remote bytes overwrite the local file.

use crate::file::{BinlogError, BinlogFile};
use std::path::Path;
use tracing::info;

/// Decide the authoritative binlog copy and return it.
///
/// Ties favor local: the node about to take ownership already has the
/// newer-or-equal state.
pub fn reconcile(
    path: impl AsRef<Path>,
    remote_bytes: &[u8],
    remote_timestamp_ms: u64,
) -> Result<BinlogFile, BinlogError> {
    let path = path.as_ref();
    let mut local = BinlogFile::open(path)?;
    let local_timestamp_ms = local.last_modified_epoch_ms();

    info!(
        path = %path.display(),
        local_ms = local_timestamp_ms,
        remote_ms = remote_timestamp_ms,
        remote_size = %crate::human_readable_size(remote_bytes.len() as u64),
        "Reconciling session binlog"
    );

    if local_timestamp_ms >= remote_timestamp_ms {
        info!(path = %path.display(), "Using local binlog");
        Ok(local)
    } else {
        info!(path = %path.display(), "Using remote binlog, overwriting local copy");
        local.save(remote_bytes)?;
        drop(local);
        BinlogFile::open(path)
    }
}
