use tokio::sync::{broadcast, mpsc};

use crate::delivery::MessageQueuedEvent;
use crate::metrics::DeliveryMetrics;

/// Background task consuming delivery hand-off events.
///
/// Transport is out of scope for this service; the worker records each
/// hand-off so an external sender can be attached here later.
pub struct DeliveryWorker {
    receiver: mpsc::Receiver<MessageQueuedEvent>,
    shutdown: broadcast::Receiver<()>,
}

impl DeliveryWorker {
    pub fn new(
        receiver: mpsc::Receiver<MessageQueuedEvent>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self { receiver, shutdown }
    }

    /// Run until shutdown is signalled or every notifier is dropped.
    ///
    /// Returns the number of events processed.
    pub async fn run(mut self) -> u64 {
        let mut processed = 0u64;

        tracing::info!("Delivery worker started");

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Delivery worker received shutdown signal");
                    break;
                }
                event = self.receiver.recv() => {
                    match event {
                        Some(event) => {
                            Self::handle(&event);
                            processed += 1;
                        }
                        None => {
                            tracing::info!("Delivery channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Events already accepted are still recorded
        self.receiver.close();
        while let Ok(event) = self.receiver.try_recv() {
            Self::handle(&event);
            processed += 1;
        }

        tracing::info!(processed, "Delivery worker stopped");
        processed
    }

    fn handle(event: &MessageQueuedEvent) {
        DeliveryMetrics::record_processed();
        tracing::info!(
            message_id = event.message_id,
            campaign_id = event.campaign_id,
            customer_id = event.customer_id,
            channel = %event.channel,
            "Sending message"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::delivery::{delivery_channel, DeliveryNotifier};
    use crate::domain::Channel;

    fn event(message_id: i64) -> MessageQueuedEvent {
        MessageQueuedEvent {
            message_id,
            campaign_id: 1,
            customer_id: 10,
            channel: Channel::Sms,
            content: "Hi Ann".to_string(),
            queued_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_worker_drains_until_notifier_dropped() {
        let (notifier, receiver) = delivery_channel(8);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        notifier.message_queued(event(1));
        notifier.message_queued(event(2));
        drop(notifier);

        let processed = DeliveryWorker::new(receiver, shutdown_rx).run().await;
        assert_eq!(processed, 2);
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let (notifier, receiver) = delivery_channel(8);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(DeliveryWorker::new(receiver, shutdown_rx).run());
        notifier.message_queued(event(1));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        shutdown_tx.send(()).unwrap();

        let processed = handle.await.unwrap();
        assert_eq!(processed, 1);
    }
}
