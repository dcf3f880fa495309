//! Catalog change notifications.
//!
//! Front ends cache rendered views of the collection; they subscribe here
//! and drop those caches whenever a mutation has been persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::document::DocumentStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CatalogChange {
    Created,
    StatusChanged { status: DocumentStatus },
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEvent {
    #[serde(flatten)]
    pub change: CatalogChange,
    pub ids: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl CatalogEvent {
    pub fn new(change: CatalogChange, ids: Vec<String>) -> Self {
        Self {
            change,
            ids,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct CatalogBroadcaster {
    sender: broadcast::Sender<CatalogEvent>,
}

impl CatalogBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn send(&self, event: CatalogEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.sender.subscribe()
    }

    pub fn created(&self, ids: Vec<String>) {
        self.send(CatalogEvent::new(CatalogChange::Created, ids));
    }

    pub fn status_changed(&self, ids: Vec<String>, status: DocumentStatus) {
        self.send(CatalogEvent::new(CatalogChange::StatusChanged { status }, ids));
    }

    pub fn deleted(&self, ids: Vec<String>) {
        self.send(CatalogEvent::new(CatalogChange::Deleted, ids));
    }
}

impl Default for CatalogBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_receivers_is_fine() {
        let broadcaster = CatalogBroadcaster::default();
        broadcaster.deleted(vec!["a".to_string()]);
    }

    #[test]
    fn test_subscriber_receives_events() {
        let broadcaster = CatalogBroadcaster::default();
        let mut rx = broadcaster.subscribe();

        broadcaster.status_changed(vec!["a".to_string()], DocumentStatus::Paid);

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event.change,
            CatalogChange::StatusChanged {
                status: DocumentStatus::Paid
            }
        );
        assert_eq!(event.ids, vec!["a"]);
    }

    #[test]
    fn test_event_json_shape() {
        let event = CatalogEvent::new(CatalogChange::Created, vec!["a".to_string()]);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "created");
        assert_eq!(json["ids"], serde_json::json!(["a"]));
    }
}
