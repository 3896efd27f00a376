//! Delivery hand-off.
//!
//! After a campaign send persists an outbound message it publishes a
//! [`MessageQueuedEvent`]. A notifier decides where the event goes; the default
//! wiring pushes it onto a bounded channel drained by
//! [`crate::tasks::DeliveryWorker`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::domain::{Channel, OutboundMessage};
use crate::metrics::DeliveryMetrics;

/// A persisted message ready for transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageQueuedEvent {
    pub message_id: i64,
    pub campaign_id: i64,
    pub customer_id: i64,
    pub channel: Channel,
    pub content: String,
    pub queued_at: DateTime<Utc>,
}

impl MessageQueuedEvent {
    pub fn new(message: &OutboundMessage, channel: Channel) -> Self {
        Self {
            message_id: message.id,
            campaign_id: message.campaign_id,
            customer_id: message.customer_id,
            channel,
            content: message.rendered_content.clone(),
            queued_at: message.created_at,
        }
    }
}

/// Receives an event for every outbound message persisted by a send.
///
/// Publishing never fails from the sender's point of view. Implementations log
/// their own problems and must not block.
pub trait DeliveryNotifier: Send + Sync {
    fn message_queued(&self, event: MessageQueuedEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDeliveryNotifier;

impl DeliveryNotifier for NoopDeliveryNotifier {
    fn message_queued(&self, event: MessageQueuedEvent) {
        tracing::trace!(message_id = event.message_id, "Delivery hand-off disabled, event discarded");
    }
}

/// Forwards events to a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelDeliveryNotifier {
    sender: mpsc::Sender<MessageQueuedEvent>,
}

impl ChannelDeliveryNotifier {
    pub fn new(sender: mpsc::Sender<MessageQueuedEvent>) -> Self {
        Self { sender }
    }
}

impl DeliveryNotifier for ChannelDeliveryNotifier {
    fn message_queued(&self, event: MessageQueuedEvent) {
        let message_id = event.message_id;

        match self.sender.try_send(event) {
            Ok(()) => DeliveryMetrics::record_handed_off(),
            Err(mpsc::error::TrySendError::Full(_)) => {
                DeliveryMetrics::record_dropped();
                tracing::warn!(message_id, "Delivery channel full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                DeliveryMetrics::record_dropped();
                tracing::warn!(message_id, "Delivery channel closed, event dropped");
            }
        }
    }
}

/// Create a notifier and the receiving end for the delivery worker.
pub fn delivery_channel(
    buffer: usize,
) -> (ChannelDeliveryNotifier, mpsc::Receiver<MessageQueuedEvent>) {
    let (sender, receiver) = mpsc::channel(buffer.max(1));
    (ChannelDeliveryNotifier::new(sender), receiver)
}
