//! Store contract for campaigns, customers and outbound messages.
//!
//! The service and the dispatch coordinator only talk to this trait, so the
//! in-memory and PostgreSQL backends can be swapped by configuration.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    Campaign, CampaignListing, Customer, ListCampaignsQuery, NewCampaign, NewCustomer,
    NewOutboundMessage, OutboundMessage,
};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The operation did not finish within the configured limit
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value could not be mapped back to the domain
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Backend trait for campaign storage.
///
/// Implementations must be `Send + Sync`; a single instance is shared by every
/// request handler and every dispatch task.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Backend identifier, e.g. `memory` or `postgres`
    fn backend_type(&self) -> &'static str;

    /// Insert a campaign and return it with its id and creation time.
    async fn add_campaign(&self, campaign: NewCampaign) -> Result<Campaign, StoreError>;

    /// One page of campaigns, newest first, plus the total matching the filters.
    async fn list_campaigns(&self, query: &ListCampaignsQuery) -> Result<CampaignListing, StoreError>;

    async fn get_campaign(&self, id: i64) -> Result<Campaign, StoreError>;

    async fn get_customer(&self, id: i64) -> Result<Customer, StoreError>;

    /// Insert a customer. Used for seeding.
    async fn add_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    /// Persist one personalized message for a campaign send.
    async fn create_outbound_message(
        &self,
        message: NewOutboundMessage,
    ) -> Result<OutboundMessage, StoreError>;
}
