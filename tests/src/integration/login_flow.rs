//! End-to-end login and shutdown choreography over a local-mode cluster:
//! scripted engine behind an execution gateway served on the bus, remote
//! client, event multiplexer, and the authorization machine on top.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{
        eventually, exclusive_local_cluster, phone_settings, LoginFactory, ScriptedPrompt,
    };
    use shared_types::{AuthorizationState, EngineRequest, EngineUpdate, HandleState};
    use sm_02_binlog::CLEANABLE_SUBDIRECTORIES;
    use sm_04_gateway::LocalSession;
    use sm_06_auth::AuthorizationStateMachine;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_password_login_reaches_ready_and_close_purges_once() {
        let (_guard, cluster) = exclusive_local_cluster();
        let dir = tempfile::tempdir().unwrap();
        let settings = phone_settings(dir.path());
        let session_dir = PathBuf::from(&settings.database_directory);

        let session = LocalSession::start(cluster, "session.alice").await.unwrap();
        let connection = Arc::new(session);

        // Wrong password first; the machine recovers and asks again.
        let prompt = ScriptedPrompt::new(&["wrong", "hunter2"]);
        let machine =
            AuthorizationStateMachine::create(settings, connection.clone(), prompt)
                .await
                .unwrap();
        let mut updates = machine.updates();
        let mut errors = machine.errors();

        connection
            .initialize(&LoginFactory::with_password("hunter2"))
            .unwrap();
        eventually(|| machine.state() == AuthorizationState::Ready).await;

        // The rejected password surfaced on the non-fatal stream.
        let rejected = timeout(Duration::from_secs(2), errors.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.message, "PASSWORD_HASH_INVALID");

        // Artifacts to be purged on shutdown.
        for name in CLEANABLE_SUBDIRECTORIES {
            std::fs::create_dir_all(session_dir.join(name)).unwrap();
        }

        machine.close().await.unwrap();
        machine.close().await.unwrap();

        // Post-ready lifecycle updates reach downstream subscribers.
        let first = timeout(Duration::from_secs(2), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            first,
            EngineUpdate::AuthorizationState(AuthorizationState::Closing)
        );

        eventually(|| machine.state() == AuthorizationState::Closed).await;
        eventually(|| connection.state() == HandleState::Destroyed).await;
        for name in CLEANABLE_SUBDIRECTORIES {
            eventually(|| !session_dir.join(name).exists()).await;
        }
        assert!(session_dir.exists());
    }

    #[tokio::test]
    async fn test_pre_ready_events_never_reach_downstream() {
        let (_guard, cluster) = exclusive_local_cluster();
        let dir = tempfile::tempdir().unwrap();

        let session = LocalSession::start(cluster, "session.bob").await.unwrap();
        let connection = Arc::new(session);

        let machine = AuthorizationStateMachine::create(
            phone_settings(dir.path()),
            connection.clone(),
            ScriptedPrompt::new(&[]),
        )
        .await
        .unwrap();
        let mut updates = machine.updates();

        connection
            .initialize(&LoginFactory::without_password())
            .unwrap();
        eventually(|| machine.state() == AuthorizationState::Ready).await;

        // Everything seen so far was pre-ready plumbing; nothing downstream.
        assert!(
            timeout(Duration::from_millis(100), updates.recv())
                .await
                .is_err(),
            "pre-ready events must be consumed internally"
        );

        // A post-ready raw request produces no state change and no crash.
        let result = machine
            .send(EngineRequest::Raw(serde_json::json!({"@type": "getMe"})))
            .await
            .unwrap();
        assert!(!result.is_err());
    }
}
