//! In-memory campaign store using DashMap.
//!
//! Records live only as long as the process. Used as the default backend and
//! as the store behind the test suites.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::{
    Campaign, CampaignListing, CampaignSummary, Customer, ListCampaignsQuery, NewCampaign,
    NewCustomer, NewOutboundMessage, OutboundMessage,
};

use super::backend::{CampaignStore, StoreError};

/// In-memory campaign store.
///
/// Ids are handed out from per-table atomic sequences starting at 1.
#[derive(Default)]
pub struct MemoryCampaignStore {
    campaigns: DashMap<i64, Campaign>,
    customers: DashMap<i64, Customer>,
    messages: DashMap<i64, OutboundMessage>,
    campaign_seq: AtomicI64,
    customer_seq: AtomicI64,
    message_seq: AtomicI64,
}

impl MemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a customer with a caller-chosen id, replacing any existing one.
    pub fn seed_customer(&self, customer: Customer) {
        self.customer_seq.fetch_max(customer.id, Ordering::SeqCst);
        self.customers.insert(customer.id, customer);
    }

    /// Messages created for a campaign, in creation order
    pub fn messages_for_campaign(&self, campaign_id: i64) -> Vec<OutboundMessage> {
        let mut messages: Vec<OutboundMessage> = self
            .messages
            .iter()
            .filter(|entry| entry.campaign_id == campaign_id)
            .map(|entry| entry.value().clone())
            .collect();
        messages.sort_by_key(|m| m.id);
        messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    fn next_id(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn add_campaign(&self, campaign: NewCampaign) -> Result<Campaign, StoreError> {
        let record = Campaign {
            id: Self::next_id(&self.campaign_seq),
            name: campaign.name,
            channel: campaign.channel,
            status: campaign.status,
            base_template: campaign.base_template,
            scheduled_at: campaign.scheduled_at,
            created_at: Utc::now(),
            stats: serde_json::json!({}),
        };

        self.campaigns.insert(record.id, record.clone());

        tracing::debug!(campaign_id = record.id, "Campaign stored in memory");
        Ok(record)
    }

    async fn list_campaigns(&self, query: &ListCampaignsQuery) -> Result<CampaignListing, StoreError> {
        let status = query.filter.status();
        let channel = query.filter.channel();

        let mut matching: Vec<CampaignSummary> = self
            .campaigns
            .iter()
            .filter(|c| status.map_or(true, |s| c.status.as_str() == s))
            .filter(|c| channel.map_or(true, |ch| c.channel.as_str() == ch))
            .map(|c| CampaignSummary::from(c.value()))
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total_count = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();

        Ok(CampaignListing { items, total_count })
    }

    async fn get_campaign(&self, id: i64) -> Result<Campaign, StoreError> {
        self.campaigns
            .get(&id)
            .map(|c| c.value().clone())
            .ok_or_else(|| StoreError::not_found("campaign", id))
    }

    async fn get_customer(&self, id: i64) -> Result<Customer, StoreError> {
        self.customers
            .get(&id)
            .map(|c| c.value().clone())
            .ok_or_else(|| StoreError::not_found("customer", id))
    }

    async fn add_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let record = Customer {
            id: Self::next_id(&self.customer_seq),
            first_name: customer.first_name,
            last_name: customer.last_name,
            location: customer.location,
            preferred_product: customer.preferred_product,
            phone: customer.phone,
            created_at: Utc::now(),
        };

        self.customers.insert(record.id, record.clone());
        Ok(record)
    }

    async fn create_outbound_message(
        &self,
        message: NewOutboundMessage,
    ) -> Result<OutboundMessage, StoreError> {
        let record = OutboundMessage {
            id: Self::next_id(&self.message_seq),
            campaign_id: message.campaign_id,
            customer_id: message.customer_id,
            status: message.status,
            rendered_content: message.rendered_content,
            created_at: Utc::now(),
        };

        self.messages.insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CampaignFilter, CampaignStatus, Channel, MessageStatus};

    fn new_campaign(name: &str, channel: Channel) -> NewCampaign {
        NewCampaign {
            name: name.to_string(),
            channel,
            status: CampaignStatus::Draft,
            base_template: "Hi {FirstName}".to_string(),
            scheduled_at: None,
        }
    }

    fn query(page: i64, page_size: i64, status: Option<&str>, channel: Option<&str>) -> ListCampaignsQuery {
        ListCampaignsQuery::new(
            Some(page),
            Some(page_size),
            CampaignFilter {
                status: status.map(String::from),
                channel: channel.map(String::from),
            },
        )
    }

    #[tokio::test]
    async fn test_add_and_get_campaign() {
        let store = MemoryCampaignStore::new();
        let first = store.add_campaign(new_campaign("a", Channel::Sms)).await.unwrap();
        let second = store.add_campaign(new_campaign("b", Channel::Sms)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.get_campaign(1).await.unwrap().name, "a");
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryCampaignStore::new();

        let err = store.get_campaign(42).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "campaign", id: 42 }));

        let err = store.get_customer(7).await.unwrap_err();
        assert_eq!(err.to_string(), "customer 7 not found");
    }

    #[tokio::test]
    async fn test_list_pages_and_total() {
        let store = MemoryCampaignStore::new();
        for i in 0..5 {
            store
                .add_campaign(new_campaign(&format!("c{i}"), Channel::Sms))
                .await
                .unwrap();
        }

        let listing = store.list_campaigns(&query(1, 2, None, None)).await.unwrap();
        assert_eq!(listing.total_count, 5);
        assert_eq!(listing.items.len(), 2);
        // newest first
        assert_eq!(listing.items[0].id, 5);

        let listing = store.list_campaigns(&query(3, 2, None, None)).await.unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, 1);

        let listing = store.list_campaigns(&query(9, 2, None, None)).await.unwrap();
        assert!(listing.items.is_empty());
        assert_eq!(listing.total_count, 5);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let store = MemoryCampaignStore::new();
        store.add_campaign(new_campaign("sms", Channel::Sms)).await.unwrap();
        store
            .add_campaign(new_campaign("wa", Channel::Whatsapp))
            .await
            .unwrap();

        let listing = store
            .list_campaigns(&query(1, 10, None, Some("whatsapp")))
            .await
            .unwrap();
        assert_eq!(listing.total_count, 1);
        assert_eq!(listing.items[0].name, "wa");

        let listing = store
            .list_campaigns(&query(1, 10, Some("sent"), None))
            .await
            .unwrap();
        assert_eq!(listing.total_count, 0);

        let listing = store
            .list_campaigns(&query(1, 10, Some(""), Some("")))
            .await
            .unwrap();
        assert_eq!(listing.total_count, 2);
    }

    #[tokio::test]
    async fn test_seed_and_add_customer() {
        let store = MemoryCampaignStore::new();
        store.seed_customer(Customer {
            id: 10,
            first_name: Some("Ann".to_string()),
            last_name: None,
            location: None,
            preferred_product: None,
            phone: "+254700000010".to_string(),
            created_at: Utc::now(),
        });

        assert_eq!(
            store.get_customer(10).await.unwrap().first_name.as_deref(),
            Some("Ann")
        );

        // new ids continue after the seeded one
        let added = store
            .add_customer(NewCustomer {
                phone: "+254700000011".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(added.id, 11);
    }

    #[tokio::test]
    async fn test_outbound_messages() {
        let store = MemoryCampaignStore::new();
        store
            .create_outbound_message(NewOutboundMessage::pending(1, 10, "Hi Ann".to_string()))
            .await
            .unwrap();
        store
            .create_outbound_message(NewOutboundMessage::pending(2, 10, "Other".to_string()))
            .await
            .unwrap();
        store
            .create_outbound_message(NewOutboundMessage::pending(1, 11, "Hi Bo".to_string()))
            .await
            .unwrap();

        let messages = store.messages_for_campaign(1);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].rendered_content, "Hi Ann");
        assert_eq!(messages[1].rendered_content, "Hi Bo");
        assert!(messages.iter().all(|m| m.status == MessageStatus::Pending));
        assert_eq!(store.message_count(), 3);
    }
}
