//! PostgreSQL-based campaign store.
//!
//! Tables:
//! - `campaigns` - campaign definitions; `channel` and `status` are stored as text
//! - `customers` - customer profiles used for personalization
//! - `outbound_messages` - one row per personalized message

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    Campaign, CampaignListing, CampaignSummary, Customer, ListCampaignsQuery, NewCampaign,
    NewCustomer, NewOutboundMessage, OutboundMessage,
};

use super::backend::{CampaignStore, StoreError};

const CAMPAIGN_COLUMNS: &str = "id, name, channel::text AS channel, status::text AS status, \
     base_template, scheduled_at, created_at, stats";

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, location, preferred_product, phone, created_at";

const MESSAGE_COLUMNS: &str =
    "id, campaign_id, customer_id, status::text AS status, rendered_content, created_at";

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: i64,
    name: String,
    channel: String,
    status: String,
    base_template: String,
    scheduled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    stats: Option<serde_json::Value>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = StoreError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Campaign {
            id: row.id,
            name: row.name,
            channel: row.channel.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            base_template: row.base_template,
            scheduled_at: row.scheduled_at,
            created_at: row.created_at,
            stats: row.stats.unwrap_or_else(|| serde_json::json!({})),
        })
    }
}

#[derive(sqlx::FromRow)]
struct CampaignSummaryRow {
    id: i64,
    name: String,
    channel: String,
    status: String,
    scheduled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    total_count: i64,
}

impl TryFrom<CampaignSummaryRow> for CampaignSummary {
    type Error = StoreError;

    fn try_from(row: CampaignSummaryRow) -> Result<Self, Self::Error> {
        Ok(CampaignSummary {
            id: row.id,
            name: row.name,
            channel: row.channel.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            scheduled_at: row.scheduled_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    location: Option<String>,
    preferred_product: Option<String>,
    phone: String,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            location: row.location,
            preferred_product: row.preferred_product,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    campaign_id: i64,
    customer_id: i64,
    status: String,
    rendered_content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for OutboundMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(OutboundMessage {
            id: row.id,
            campaign_id: row.campaign_id,
            customer_id: row.customer_id,
            status: row.status.parse().map_err(corrupt)?,
            rendered_content: row.rendered_content,
            created_at: row.created_at,
        })
    }
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

/// PostgreSQL-based campaign store.
pub struct PostgresCampaignStore {
    pool: PgPool,
}

impl PostgresCampaignStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_campaigns(&self, query: &ListCampaignsQuery) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM campaigns
            WHERE ($1::text IS NULL OR status::text = $1)
              AND ($2::text IS NULL OR channel::text = $2)
            "#,
        )
        .bind(query.filter.status())
        .bind(query.filter.channel())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl CampaignStore for PostgresCampaignStore {
    fn backend_type(&self) -> &'static str {
        "postgres"
    }

    async fn add_campaign(&self, campaign: NewCampaign) -> Result<Campaign, StoreError> {
        let sql = format!(
            "INSERT INTO campaigns (name, channel, status, base_template, scheduled_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CAMPAIGN_COLUMNS}"
        );

        let row: CampaignRow = sqlx::query_as(&sql)
            .bind(&campaign.name)
            .bind(campaign.channel.as_str())
            .bind(campaign.status.as_str())
            .bind(&campaign.base_template)
            .bind(campaign.scheduled_at)
            .fetch_one(&self.pool)
            .await?;

        tracing::trace!(campaign_id = row.id, "Campaign inserted into PostgreSQL");

        row.try_into()
    }

    async fn list_campaigns(&self, query: &ListCampaignsQuery) -> Result<CampaignListing, StoreError> {
        let rows: Vec<CampaignSummaryRow> = sqlx::query_as(
            r#"
            SELECT id, name, channel::text AS channel, status::text AS status,
                   scheduled_at, created_at, COUNT(*) OVER() AS total_count
            FROM campaigns
            WHERE ($1::text IS NULL OR status::text = $1)
              AND ($2::text IS NULL OR channel::text = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.filter.status())
        .bind(query.filter.channel())
        .bind(query.page_size)
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        // A page past the end has no rows to carry the window total
        let total_count = match rows.first() {
            Some(row) => row.total_count,
            None if query.offset() > 0 => self.count_campaigns(query).await?,
            None => 0,
        };

        let items = rows
            .into_iter()
            .map(CampaignSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CampaignListing { items, total_count })
    }

    async fn get_campaign(&self, id: i64) -> Result<Campaign, StoreError> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1");

        let row: Option<CampaignRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| StoreError::not_found("campaign", id))?
            .try_into()
    }

    async fn get_customer(&self, id: i64) -> Result<Customer, StoreError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");

        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Customer::from)
            .ok_or_else(|| StoreError::not_found("customer", id))
    }

    async fn add_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let sql = format!(
            "INSERT INTO customers (first_name, last_name, location, preferred_product, phone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CUSTOMER_COLUMNS}"
        );

        let row: CustomerRow = sqlx::query_as(&sql)
            .bind(&customer.first_name)
            .bind(&customer.last_name)
            .bind(&customer.location)
            .bind(&customer.preferred_product)
            .bind(&customer.phone)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn create_outbound_message(
        &self,
        message: NewOutboundMessage,
    ) -> Result<OutboundMessage, StoreError> {
        let sql = format!(
            "INSERT INTO outbound_messages (campaign_id, customer_id, status, rendered_content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {MESSAGE_COLUMNS}"
        );

        let row: MessageRow = sqlx::query_as(&sql)
            .bind(message.campaign_id)
            .bind(message.customer_id)
            .bind(message.status.as_str())
            .bind(&message.rendered_content)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }
}
