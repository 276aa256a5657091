use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the service layer after successful mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    BrandCreated(Uuid),
    BrandUpdated(Uuid),
    BrandDeleted(Uuid),
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Inventory events
    InventoryMovementRecorded {
        movement_id: Uuid,
        product_id: Uuid,
        movement_type: String,
        effective_quantity: i32,
    },

    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    OrderPaymentStatusChanged {
        order_id: Uuid,
        new_status: String,
    },
    OrderCancelled(Uuid),

    // User events
    UserCreated(Uuid),
    UserUpdated(Uuid),
    UserDeactivated(Uuid),
}

/// Cloneable sending half of the event channel, shared across services.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Mutations must not be rolled back because event delivery failed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Processes incoming events. Downstream integrations hook in here; the
/// default processor logs each event for traceability.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Order {} status changed: {} -> {}",
                    order_id, old_status, new_status
                );
            }
            Event::InventoryMovementRecorded {
                movement_id,
                product_id,
                movement_type,
                effective_quantity,
            } => {
                info!(
                    "Inventory movement {} recorded for product {}: {} ({:+})",
                    movement_id, product_id, movement_type, effective_quantity
                );
            }
            other => {
                info!("Event: {:?}", other);
            }
        }
    }

    info!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::BrandCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::BrandCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender.send_or_log(Event::OrderCreated(Uuid::new_v4())).await;
    }
}
