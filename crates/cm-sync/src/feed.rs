//! Realtime change feed

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use cm_core::{CmResult, Id};
use cm_models::serde_util::id_from_value;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Wildcard; also used for kinds this client does not recognise
    All,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
            ChangeKind::All => "*",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            _ => ChangeKind::All,
        }
    }
}

impl Serialize for ChangeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChangeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ChangeKind::parse(&raw))
    }
}

/// One change notification. Only `new` is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(alias = "eventType")]
    pub event: ChangeKind,
    /// Partial (or, for inserts, full) record keyed by `id`
    #[serde(default)]
    pub new: Value,
}

impl ChangeEvent {
    pub fn new(event: ChangeKind, new: Value) -> Self {
        Self { event, new }
    }

    pub fn insert(new: Value) -> Self {
        Self::new(ChangeKind::Insert, new)
    }

    pub fn update(new: Value) -> Self {
        Self::new(ChangeKind::Update, new)
    }

    pub fn record_id(&self) -> Option<Id> {
        self.new.get("id").and_then(id_from_value)
    }
}

pub type ChangeStream = BoxStream<'static, ChangeEvent>;

/// Subscription source for change events on one collection.
///
/// Dropping the returned stream closes the subscription.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, channel: &str, collection: &str) -> CmResult<ChangeStream>;
}

type Topic = (String, String);

/// In-process change feed backed by `tokio::sync::broadcast`
#[derive(Debug)]
pub struct BroadcastFeed {
    capacity: usize,
    topics: Mutex<HashMap<Topic, broadcast::Sender<ChangeEvent>>>,
}

impl Default for BroadcastFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

impl BroadcastFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    fn sender(&self, channel: &str, collection: &str) -> broadcast::Sender<ChangeEvent> {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((channel.to_string(), collection.to_string()))
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Deliver an event to current subscribers; returns how many received it
    pub fn publish(&self, channel: &str, collection: &str, event: ChangeEvent) -> usize {
        match self.sender(channel, collection).send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(channel, collection, "no subscribers for change event");
                0
            }
        }
    }

    pub fn subscriber_count(&self, channel: &str, collection: &str) -> usize {
        self.sender(channel, collection).receiver_count()
    }
}

#[async_trait]
impl ChangeFeed for BroadcastFeed {
    async fn subscribe(&self, channel: &str, collection: &str) -> CmResult<ChangeStream> {
        let receiver = self.sender(channel, collection).subscribe();
        debug!(channel, collection, "change feed subscribed");

        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change feed lagged, events dropped");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_decoding() {
        let event: ChangeEvent = serde_json::from_value(json!({
            "event": "update",
            "new": { "id": 12, "progress": { "percentageComplete": 75 } }
        }))
        .unwrap();
        assert_eq!(event.event, ChangeKind::Update);
        assert_eq!(event.record_id().as_deref(), Some("12"));

        let event: ChangeEvent =
            serde_json::from_value(json!({ "eventType": "TRUNCATE", "new": {} })).unwrap();
        assert_eq!(event.event, ChangeKind::All);
        assert_eq!(event.record_id(), None);
    }

    #[tokio::test]
    async fn test_broadcast_delivery() {
        let feed = BroadcastFeed::default();
        assert_eq!(feed.publish("updates", "projects", ChangeEvent::update(json!({}))), 0);

        let mut stream = feed.subscribe("updates", "projects").await.unwrap();
        assert_eq!(feed.subscriber_count("updates", "projects"), 1);
        assert_eq!(feed.subscriber_count("updates", "materials"), 0);

        feed.publish("updates", "projects", ChangeEvent::update(json!({ "id": "p1" })));
        let event = stream.next().await.unwrap();
        assert_eq!(event.record_id().as_deref(), Some("p1"));

        drop(stream);
        assert_eq!(feed.subscriber_count("updates", "projects"), 0);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let feed = BroadcastFeed::new(2);
        let mut stream = feed.subscribe("updates", "projects").await.unwrap();
        for n in 0..5 {
            feed.publish("updates", "projects", ChangeEvent::update(json!({ "id": n })));
        }
        let event = stream.next().await.unwrap();
        assert_eq!(event.record_id().as_deref(), Some("3"));
    }
}
