use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Events emitted by the domain services after a transaction commits.
///
/// The bus is a plain in-process mpsc channel drained by [`process_events`];
/// delivery is best-effort and never affects the ledger outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    AdjustmentCreated(Uuid),
    AdjustmentUpdated(Uuid),
    AdjustmentArchived(Uuid),
    AdjustmentRestored(Uuid),

    TransferCreated(Uuid),
    TransferUpdated(Uuid),
    TransferArchived(Uuid),
    TransferRestored(Uuid),

    OrderCreated(Uuid),
    RefundCreated(Uuid),

    ShiftOpened(Uuid),
    ShiftClosed(Uuid),

    ImportCompleted {
        products_created: usize,
        variants_created: usize,
        variants_updated: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "event processed");

        if let Err(e) = serde_json::to_string(&event) {
            error!("Failed to serialize event for audit log: {}", e);
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_receive_round_trip() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();
        sender.send(Event::OrderCreated(id)).await.unwrap();
        match rx.recv().await {
            Some(Event::OrderCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_on_closed_channel_errors() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::ShiftClosed(Uuid::new_v4())).await.is_err());
    }
}
