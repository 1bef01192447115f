//! Execute/result and event routing between a served gateway and a remote
//! client across the cluster bus.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{exclusive_local_cluster, LoginFactory};
    use shared_types::{
        AuthorizationState, EngineObject, EngineRequest, EngineResult, EngineUpdate,
        SignalEnvelope,
    };
    use sm_01_wire::{update_signal_codec, ExecuteCodec, ResultCodec};
    use sm_04_gateway::{
        session_events_address, session_execute_address, GatewayError, LocalSession,
        RemoteGateway, SessionConnection,
    };
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_execute_round_trip_across_the_bus() {
        let (_guard, cluster) = exclusive_local_cluster();
        let session = LocalSession::start(cluster.clone(), "session.remote")
            .await
            .unwrap();
        session.initialize(&LoginFactory::without_password()).unwrap();

        // A second, independent client against the same served session.
        let client = RemoteGateway::new(cluster, "session.remote");
        let result = client
            .execute(
                EngineRequest::Raw(serde_json::json!({"@type": "getMe"})),
                false,
            )
            .await
            .unwrap();
        assert_eq!(result, EngineResult::Ok(EngineObject::Ok));
    }

    #[tokio::test]
    async fn test_codec_names_registered_once_served() {
        let (_guard, cluster) = exclusive_local_cluster();
        let _session = LocalSession::start(cluster.clone(), "session.codecs")
            .await
            .unwrap();

        assert!(cluster.codec_registered(ExecuteCodec::new().name()));
        assert!(cluster.codec_registered(ResultCodec::new().name()));
        assert!(cluster.codec_registered(update_signal_codec().name()));
        // Registration is idempotent, not an error.
        assert!(!cluster.register_codec(ExecuteCodec::new().name()));
    }

    #[tokio::test]
    async fn test_execute_without_server_is_a_delivery_error() {
        let (_guard, cluster) = exclusive_local_cluster();
        let client = RemoteGateway::new(cluster, "session.nobody");

        let err = client
            .execute(EngineRequest::Close, false)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Delivery(_)));
    }

    #[tokio::test]
    async fn test_events_fan_out_to_remote_subscribers() {
        let (_guard, cluster) = exclusive_local_cluster();
        let session = LocalSession::start(cluster.clone(), "session.events")
            .await
            .unwrap();

        let client = RemoteGateway::new(cluster, "session.events");
        let mut events = client.receive().await.unwrap();

        session.initialize(&LoginFactory::without_password()).unwrap();

        let first = timeout(Duration::from_secs(2), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            first,
            SignalEnvelope::Item(EngineUpdate::AuthorizationState(
                AuthorizationState::WaitParameters
            ))
        );
    }

    #[tokio::test]
    async fn test_late_remote_subscriber_observes_completion() {
        let (_guard, cluster) = exclusive_local_cluster();
        let session = LocalSession::start(cluster.clone(), "session.late")
            .await
            .unwrap();
        session.initialize(&LoginFactory::without_password()).unwrap();

        let result = session.execute(EngineRequest::Close, false).await.unwrap();
        assert_eq!(result, EngineResult::Ok(EngineObject::Ok));
        crate::integration::fixtures::eventually(|| {
            session.state() == shared_types::HandleState::Destroyed
        })
        .await;

        // Nothing subscribed while the feed ran; the served side replays the
        // terminal envelope instead of leaving the stream parked.
        let client = RemoteGateway::new(cluster, "session.late");
        let mut events = client.receive().await.unwrap();
        let envelope = timeout(Duration::from_secs(2), events.recv())
            .await
            .expect("completion replayed for a late subscriber")
            .unwrap();
        assert!(envelope.is_complete());
    }

    #[tokio::test]
    async fn test_addresses_derive_from_alias() {
        assert_eq!(session_execute_address("s"), "s.execute");
        assert_eq!(session_events_address("s"), "s.events");
    }
}
