//! Multi-subscriber event delivery: every subscriber of one session feed
//! observes the same envelope sequence exactly once.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{exclusive_local_cluster, LoginFactory};
    use shared_types::{AuthorizationState, EngineRequest, EngineUpdate, SignalEnvelope};
    use sm_04_gateway::{LocalSession, SessionConnection};
    use sm_05_multiplexer::{EventMultiplexer, MuxStream};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn state(s: AuthorizationState) -> SignalEnvelope<EngineUpdate> {
        SignalEnvelope::Item(EngineUpdate::AuthorizationState(s))
    }

    async fn drain(mut stream: MuxStream) -> Vec<SignalEnvelope<EngineUpdate>> {
        let mut seen = Vec::new();
        loop {
            match timeout(Duration::from_secs(2), stream.recv()).await.unwrap() {
                Some(envelope) => seen.push(envelope),
                None => return seen,
            }
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_identical_sequences_exactly_once() {
        let (_guard, cluster) = exclusive_local_cluster();
        let session = Arc::new(
            LocalSession::start(cluster, "session.fanout")
                .await
                .unwrap(),
        );

        let mux = EventMultiplexer::new(session.clone());
        let first = mux.subscribe().await.unwrap();
        let second = mux.subscribe().await.unwrap();
        let third = mux.subscribe().await.unwrap();
        assert_eq!(mux.subscriber_count(), 3);

        // The engine comes up, then shuts down; both phases emit events.
        session.initialize(&LoginFactory::without_password()).unwrap();
        session.execute(EngineRequest::Close, false).await.unwrap();

        let expected = vec![
            state(AuthorizationState::WaitParameters),
            state(AuthorizationState::Closing),
            state(AuthorizationState::Closed),
            SignalEnvelope::Complete,
        ];
        assert_eq!(drain(first).await, expected);
        assert_eq!(drain(second).await, expected);
        assert_eq!(drain(third).await, expected);

        // The terminal envelope is replayed to anyone arriving late.
        let late = mux.subscribe().await.unwrap();
        assert_eq!(drain(late).await, vec![SignalEnvelope::Complete]);
        assert_eq!(mux.subscriber_count(), 0);
    }
}
