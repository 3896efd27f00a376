//! Campaign send and preview integration tests
//!
//! These tests drive the service against the in-memory store, with store
//! wrappers that count calls, inject failures, or slow operations down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use campaign_messaging_service::config::DispatchConfig;
use campaign_messaging_service::delivery::{delivery_channel, NoopDeliveryNotifier};
use campaign_messaging_service::domain::{
    Campaign, CampaignListing, CampaignStatus, Channel, CreateCampaignRequest, Customer,
    ListCampaignsQuery, NewCampaign, NewCustomer, NewOutboundMessage, OutboundMessage,
    PreviewRequest, SendCampaignRequest, SendResult,
};
use campaign_messaging_service::error::AppError;
use campaign_messaging_service::service::CampaignService;
use campaign_messaging_service::store::{CampaignStore, MemoryCampaignStore, StoreError};

// ============================================================================
// Test stores
// ============================================================================

/// Wraps the memory store; counts calls, can fail one customer's message and
/// can slow customer lookups down, for all customers or for chosen ones
struct InstrumentedStore {
    inner: MemoryCampaignStore,
    calls: AtomicUsize,
    fail_message_for: Option<i64>,
    lookup_delay: Option<Duration>,
    customer_delays: HashMap<i64, Duration>,
    active_lookups: AtomicUsize,
    max_active_lookups: AtomicUsize,
}

impl InstrumentedStore {
    fn new(inner: MemoryCampaignStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            fail_message_for: None,
            lookup_delay: None,
            customer_delays: HashMap::new(),
            active_lookups: AtomicUsize::new(0),
            max_active_lookups: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CampaignStore for InstrumentedStore {
    fn backend_type(&self) -> &'static str {
        "instrumented"
    }

    async fn add_campaign(&self, campaign: NewCampaign) -> Result<Campaign, StoreError> {
        self.call();
        self.inner.add_campaign(campaign).await
    }

    async fn list_campaigns(&self, query: &ListCampaignsQuery) -> Result<CampaignListing, StoreError> {
        self.call();
        self.inner.list_campaigns(query).await
    }

    async fn get_campaign(&self, id: i64) -> Result<Campaign, StoreError> {
        self.call();
        self.inner.get_campaign(id).await
    }

    async fn get_customer(&self, id: i64) -> Result<Customer, StoreError> {
        self.call();

        let active = self.active_lookups.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_lookups.fetch_max(active, Ordering::SeqCst);
        if let Some(delay) = self.customer_delays.get(&id).copied().or(self.lookup_delay) {
            tokio::time::sleep(delay).await;
        }
        self.active_lookups.fetch_sub(1, Ordering::SeqCst);

        self.inner.get_customer(id).await
    }

    async fn add_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        self.call();
        self.inner.add_customer(customer).await
    }

    async fn create_outbound_message(
        &self,
        message: NewOutboundMessage,
    ) -> Result<OutboundMessage, StoreError> {
        self.call();
        if self.fail_message_for == Some(message.customer_id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.create_outbound_message(message).await
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn customer(id: i64, first_name: &str) -> Customer {
    Customer {
        id,
        first_name: Some(first_name.to_string()),
        last_name: None,
        location: None,
        preferred_product: None,
        phone: format!("+2547000000{id}"),
        created_at: Utc::now(),
    }
}

/// Campaign 1 "Hi {FirstName}", customers 10 "Ann" and 11 "Bo"
async fn seeded_memory_store() -> MemoryCampaignStore {
    let store = MemoryCampaignStore::new();
    store
        .add_campaign(NewCampaign {
            name: "Welcome".to_string(),
            channel: Channel::Sms,
            status: CampaignStatus::Draft,
            base_template: "Hi {FirstName}".to_string(),
            scheduled_at: None,
        })
        .await
        .unwrap();
    store.seed_customer(customer(10, "Ann"));
    store.seed_customer(customer(11, "Bo"));
    store
}

fn service_with(store: Arc<dyn CampaignStore>, max_concurrency: usize, timeout: Duration) -> CampaignService {
    CampaignService::new(
        store,
        Arc::new(NoopDeliveryNotifier),
        &DispatchConfig {
            max_concurrency,
            ..Default::default()
        },
        timeout,
    )
}

fn send(ids: &[i64]) -> SendCampaignRequest {
    SendCampaignRequest {
        customer_ids: ids.to_vec(),
    }
}

// ============================================================================
// Send Tests
// ============================================================================

mod send_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_to_all_customers() {
        let store = Arc::new(seeded_memory_store().await);
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let result = service.send_campaign(1, send(&[10, 11])).await.unwrap();
        assert_eq!(
            result,
            SendResult {
                campaign_id: 1,
                messages_queued: 2,
                status: CampaignStatus::Sending,
            }
        );

        let mut rows: Vec<(i64, String)> = store
            .messages_for_campaign(1)
            .into_iter()
            .map(|m| (m.customer_id, m.rendered_content))
            .collect();
        rows.sort();
        assert_eq!(
            rows,
            vec![(10, "Hi Ann".to_string()), (11, "Hi Bo".to_string())]
        );
    }

    #[tokio::test]
    async fn test_send_result_json() {
        let store = Arc::new(seeded_memory_store().await);
        let service = service_with(store, 10, Duration::from_secs(5));

        let result = service.send_campaign(1, send(&[10, 11])).await.unwrap();
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({"campaign_id": 1, "messages_queued": 2, "status": "sending"})
        );
    }

    #[tokio::test]
    async fn test_one_invalid_customer() {
        let store = Arc::new(seeded_memory_store().await);
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let err = service
            .send_campaign(1, send(&[10, 999, 11]))
            .await
            .unwrap_err();

        let partial = err.partial_result().expect("partial result");
        assert!(partial.messages_queued < 3);
        assert_eq!(partial.status, CampaignStatus::Sending);
        assert!(matches!(err.root_cause(), AppError::NotFound(_)));

        // no row for the unknown customer
        let rows = store.messages_for_campaign(1);
        assert_eq!(rows.len() as u32, partial.messages_queued);
        assert!(rows.iter().all(|m| m.customer_id != 999));
    }

    #[tokio::test]
    async fn test_empty_list_rejected_before_store() {
        let store = Arc::new(InstrumentedStore::new(seeded_memory_store().await));
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let err = service.send_campaign(1, send(&[])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_terminal() {
        let store = Arc::new(InstrumentedStore::new(seeded_memory_store().await));
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let err = service.send_campaign(7, send(&[10, 11])).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        // only the campaign lookup ran
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_propagates() {
        let mut store = InstrumentedStore::new(seeded_memory_store().await);
        store.fail_message_for = Some(11);
        let store = Arc::new(store);
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let err = service.send_campaign(1, send(&[10, 11])).await.unwrap_err();

        assert!(matches!(err.root_cause(), AppError::Internal(_)));
        let partial = err.partial_result().unwrap();
        assert!(partial.messages_queued <= 1);
        assert!(store
            .inner
            .messages_for_campaign(1)
            .iter()
            .all(|m| m.customer_id == 10));
    }

    #[tokio::test]
    async fn test_sends_are_not_idempotent() {
        let store = Arc::new(seeded_memory_store().await);
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        service.send_campaign(1, send(&[10])).await.unwrap();
        service.send_campaign(1, send(&[10])).await.unwrap();

        assert_eq!(store.messages_for_campaign(1).len(), 2);
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_ceiling() {
        let memory = seeded_memory_store().await;
        let mut ids = Vec::new();
        for id in 100..124 {
            memory.seed_customer(customer(id, "Cy"));
            ids.push(id);
        }

        let mut store = InstrumentedStore::new(memory);
        store.lookup_delay = Some(Duration::from_millis(20));
        let store = Arc::new(store);
        let service = service_with(store.clone(), 3, Duration::from_secs(5));

        let result = service.send_campaign(1, send(&ids)).await.unwrap();
        assert_eq!(result.messages_queued, ids.len() as u32);

        let max_active = store.max_active_lookups.load(Ordering::SeqCst);
        assert!(max_active <= 3, "observed {max_active} concurrent lookups");
        assert!(max_active >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_started_task_completes_after_cancellation() {
        // Ann's lookup is in progress when the missing customer fails
        let mut store = InstrumentedStore::new(seeded_memory_store().await);
        store.customer_delays.insert(10, Duration::from_millis(300));
        store.customer_delays.insert(999, Duration::from_millis(30));
        let store = Arc::new(store);
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let err = service.send_campaign(1, send(&[10, 999])).await.unwrap_err();
        assert!(matches!(err.root_cause(), AppError::NotFound(_)));
        assert_eq!(err.partial_result().unwrap().messages_queued, 1);

        let rows = store.inner.messages_for_campaign(1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_id, 10);
        assert_eq!(rows[0].rendered_content, "Hi Ann");
    }

    #[tokio::test]
    async fn test_waiting_task_skipped_after_cancellation() {
        // One permit: Bo waits behind the failing customer and is skipped
        let mut store = InstrumentedStore::new(seeded_memory_store().await);
        store.customer_delays.insert(999, Duration::from_millis(30));
        let store = Arc::new(store);
        let service = service_with(store.clone(), 1, Duration::from_secs(5));

        let err = service.send_campaign(1, send(&[999, 11])).await.unwrap_err();
        assert!(matches!(err.root_cause(), AppError::NotFound(_)));
        assert_eq!(err.partial_result().unwrap().messages_queued, 0);
        assert!(store.inner.messages_for_campaign(1).is_empty());
    }

    #[tokio::test]
    async fn test_store_timeout_is_internal() {
        let mut store = InstrumentedStore::new(seeded_memory_store().await);
        store.lookup_delay = Some(Duration::from_millis(500));
        let store = Arc::new(store);
        let service = service_with(store, 10, Duration::from_millis(50));

        let err = service.send_campaign(1, send(&[10])).await.unwrap_err();
        assert!(matches!(err.root_cause(), AppError::Internal(_)));
        assert_eq!(err.partial_result().unwrap().messages_queued, 0);
    }

    #[tokio::test]
    async fn test_hand_off_events_follow_persistence() {
        let store = Arc::new(seeded_memory_store().await);
        let (notifier, mut receiver) = delivery_channel(16);
        let service = CampaignService::new(
            store.clone(),
            Arc::new(notifier),
            &DispatchConfig::default(),
            Duration::from_secs(5),
        );

        service.send_campaign(1, send(&[10, 999])).await.unwrap_err();

        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), store.messages_for_campaign(1).len());
        assert!(events.iter().all(|e| e.customer_id == 10 && e.content == "Hi Ann"));
    }
}

// ============================================================================
// Preview Tests
// ============================================================================

mod preview_tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_with_override() {
        let store = Arc::new(seeded_memory_store().await);
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let preview = service
            .preview_message(
                1,
                PreviewRequest {
                    customer_id: 10,
                    override_template: Some("Bye {FirstName}".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            serde_json::to_value(&preview).unwrap(),
            serde_json::json!({
                "rendered_message": "Bye Ann",
                "used_template": "Bye {FirstName}",
                "customer": {"id": 10, "first_name": "Ann"}
            })
        );
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_preview_requires_customer_id() {
        let store = Arc::new(InstrumentedStore::new(seeded_memory_store().await));
        let service = service_with(store.clone(), 10, Duration::from_secs(5));

        let err = service
            .preview_message(1, PreviewRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_preview_unknown_campaign() {
        let store = Arc::new(seeded_memory_store().await);
        let service = service_with(store, 10, Duration::from_secs(5));

        let err = service
            .preview_message(
                3,
                PreviewRequest {
                    customer_id: 10,
                    override_template: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_created_campaign_previews() {
        let store = Arc::new(seeded_memory_store().await);
        let service = service_with(store, 10, Duration::from_secs(5));

        let campaign = service
            .add_campaign(CreateCampaignRequest {
                name: "Restock".to_string(),
                channel: "whatsapp".to_string(),
                base_template: "{FirstName}, {PreferredProduct} is back".to_string(),
                scheduled_at: None,
            })
            .await
            .unwrap();

        let preview = service
            .preview_message(
                campaign.id,
                PreviewRequest {
                    customer_id: 11,
                    override_template: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert_eq!(preview.message, "Bo,  is back");
        assert_eq!(preview.template, campaign.base_template);
    }
}
