//! Fire-and-forget event publishing for mutation handlers.
//!
//! By the time a handler publishes, the mutation has already committed, so
//! nothing on this path may fail, block, or propagate an error back to the
//! caller. Serialization problems are logged and the event is dropped; a
//! missing hub means real-time notifications simply are not configured.

use crate::hub::Hub;
use events::{Envelope, EventType};
use log::{debug, error};
use serde::Serialize;

/// Broadcast a change notification to every connected client.
///
/// `payload` is the just-mutated entity (or, for deletes, an object
/// carrying the deleted identifier). It is wrapped in an [`Envelope`] and
/// serialized once; the hub fans the resulting frame out to all members.
pub fn publish_event<T: Serialize>(hub: Option<&Hub>, event_type: EventType, payload: &T) {
    let Some(hub) = hub else {
        return;
    };

    let data = match serde_json::to_value(payload) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to serialize '{event_type}' payload: {e}");
            return;
        }
    };

    match Envelope::new(event_type, data).to_json() {
        Ok(frame) => {
            hub.broadcast(frame);
            debug!(
                "Broadcast '{event_type}' event to {} client(s)",
                hub.client_count()
            );
        }
        Err(e) => error!("Failed to serialize '{event_type}' envelope: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::SessionId;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test]
    async fn publish_with_absent_hub_is_a_noop() {
        publish_event(None, EventType::ProductCreated, &json!({"id": 1}));
    }

    #[tokio::test]
    async fn publish_delivers_one_decodable_envelope_frame() {
        let hub = Hub::new();
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(SessionId::new(), tx);

        publish_event(
            Some(&hub),
            EventType::ProductCreated,
            &json!({"id": 7, "name": "X"}),
        );

        let frame = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for the envelope frame")
            .expect("outbound queue closed unexpectedly");
        let envelope: Envelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(envelope.event_type, EventType::ProductCreated);
        assert_eq!(envelope.data, json!({"id": 7, "name": "X"}));

        // Exactly one frame per publish.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_delete_carries_the_deleted_id() {
        let hub = Hub::new();
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(SessionId::new(), tx);

        publish_event(Some(&hub), EventType::ProductDeleted, &json!({"id": 42}));

        let frame = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for the envelope frame")
            .expect("outbound queue closed unexpectedly");
        let envelope: Envelope = serde_json::from_str(&frame).unwrap();
        assert_eq!(envelope.event_type, EventType::ProductDeleted);
        assert_eq!(envelope.data, json!({"id": 42}));
    }

    #[tokio::test]
    async fn unserializable_payload_is_dropped_silently() {
        let hub = Hub::new();
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(SessionId::new(), tx);

        // Maps with non-string keys cannot be represented in JSON.
        let bad: HashMap<(u8, u8), &str> = HashMap::from([((1, 2), "x")]);
        publish_event(Some(&hub), EventType::ProductUpdated, &bad);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }
}
