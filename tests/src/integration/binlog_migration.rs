//! Binlog ownership migration: the previous owner ships its copy over the
//! bus, the new owner reconciles it against whatever it already has.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::exclusive_local_cluster;
    use sm_02_binlog::{
        purge_session_artifacts, reconcile, BinlogFile, CLEANABLE_SUBDIRECTORIES,
    };
    use std::time::Duration;
    use tokio::time::timeout;

    const HANDOVER_ADDRESS: &str = "session.carol.binlog";

    /// Handover frame layout: 8-byte big-endian last-modified timestamp,
    /// then the raw binlog bytes.
    fn encode_handover(timestamp_ms: u64, bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + bytes.len());
        out.extend_from_slice(&timestamp_ms.to_be_bytes());
        out.extend_from_slice(bytes);
        out
    }

    fn decode_handover(frame: &[u8]) -> (u64, &[u8]) {
        let (header, bytes) = frame.split_at(8);
        (u64::from_be_bytes(header.try_into().unwrap()), bytes)
    }

    #[tokio::test]
    async fn test_newer_remote_copy_replaces_local_after_handover() {
        let (_guard, cluster) = exclusive_local_cluster();
        let mut inbox = cluster.subscribe(HANDOVER_ADDRESS, false);

        // The new owner holds a stale copy from a previous tenancy.
        let new_owner = tempfile::tempdir().unwrap();
        let local_path = new_owner.path().join("td.binlog");
        let mut stale = BinlogFile::open(&local_path).unwrap();
        stale.save(b"stale-state").unwrap();
        let stale_ts = stale.last_modified_epoch_ms();
        drop(stale);

        // The previous owner ships its copy, stamped strictly newer.
        cluster
            .publish(
                HANDOVER_ADDRESS,
                encode_handover(stale_ts + 60_000, b"current-state"),
            )
            .unwrap();

        let frame = timeout(Duration::from_secs(2), inbox.recv())
            .await
            .unwrap()
            .unwrap();
        let (remote_ts, remote_bytes) = decode_handover(&frame.bytes);
        let chosen = reconcile(&local_path, remote_bytes, remote_ts).unwrap();

        assert_eq!(chosen.bytes(), b"current-state");
        assert_eq!(std::fs::read(&local_path).unwrap(), b"current-state");
    }

    #[tokio::test]
    async fn test_stale_remote_copy_is_discarded() {
        let (_guard, cluster) = exclusive_local_cluster();
        let mut inbox = cluster.subscribe(HANDOVER_ADDRESS, false);

        let new_owner = tempfile::tempdir().unwrap();
        let local_path = new_owner.path().join("td.binlog");
        let mut local = BinlogFile::open(&local_path).unwrap();
        local.save(b"fresh-state").unwrap();
        let local_ts = local.last_modified_epoch_ms();
        drop(local);

        cluster
            .publish(
                HANDOVER_ADDRESS,
                encode_handover(local_ts.saturating_sub(60_000), b"ancient-state"),
            )
            .unwrap();

        let frame = timeout(Duration::from_secs(2), inbox.recv())
            .await
            .unwrap()
            .unwrap();
        let (remote_ts, remote_bytes) = decode_handover(&frame.bytes);
        let chosen = reconcile(&local_path, remote_bytes, remote_ts).unwrap();

        assert_eq!(chosen.bytes(), b"fresh-state");
        assert_eq!(std::fs::read(&local_path).unwrap(), b"fresh-state");
    }

    #[test]
    fn test_migrated_binlog_survives_artifact_purge() {
        let session_dir = tempfile::tempdir().unwrap();
        let binlog_path = session_dir.path().join("td.binlog");

        // Fresh node: adopt the shipped copy unconditionally.
        let chosen = reconcile(&binlog_path, b"migrated-state", u64::MAX).unwrap();
        assert_eq!(chosen.bytes(), b"migrated-state");

        for name in CLEANABLE_SUBDIRECTORIES {
            std::fs::create_dir_all(session_dir.path().join(name)).unwrap();
        }

        let removed = purge_session_artifacts(session_dir.path());

        assert_eq!(removed, CLEANABLE_SUBDIRECTORIES.len());
        assert_eq!(std::fs::read(&binlog_path).unwrap(), b"migrated-state");
    }
}
