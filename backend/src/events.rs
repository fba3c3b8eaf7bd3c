//! Real-time event fan-out for the dashboard websocket.
//!
//! Stock mutations publish into a broadcast channel; every connected
//! dashboard holds a subscription and relays the JSON frames to the client.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::services::product::LowStockProduct;
use crate::services::stock_intake::StockIntakeRecord;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events pushed to dashboard clients. Serialized as
/// `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum StockEvent {
    StockIntakeCreated(StockIntakeRecord),
    StockIntakeUpdated(StockIntakeRecord),
    StockIntakeDeleted { id: Uuid },
    /// Current number of products at or below their threshold, sent after
    /// every stock mutation so the dashboard card stays current.
    LowStockAlert { count: i64 },
    /// A specific product crossed its threshold.
    LowStockNotification { product: LowStockProduct },
}

#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<StockEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publish an event to all connected clients. Events published while
    /// nobody is connected are dropped.
    pub fn publish(&self, event: StockEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StockEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn events_serialize_with_camel_case_names() {
        let event = StockEvent::StockIntakeDeleted { id: Uuid::nil() };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "stockIntakeDeleted");
        assert_eq!(json["data"]["id"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn low_stock_alert_carries_count() {
        let event = StockEvent::LowStockAlert { count: 3 };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "lowStockAlert");
        assert_eq!(json["data"]["count"], 3);
    }

    #[test]
    fn low_stock_notification_names_the_product() {
        let event = StockEvent::LowStockNotification {
            product: LowStockProduct {
                id: Uuid::nil(),
                name: "Steel Bolts".to_string(),
                sku: "WH-001".to_string(),
                quantity: Decimal::from(4),
                min_stock_level: Decimal::from(10),
                location: None,
            },
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "lowStockNotification");
        assert_eq!(json["data"]["product"]["name"], "Steel Bolts");
        assert_eq!(json["data"]["product"]["minStockLevel"], "10");
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();

        hub.publish(StockEvent::LowStockAlert { count: 1 });

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, StockEvent::LowStockAlert { count: 1 }));
    }
}
