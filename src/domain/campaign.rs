//! Campaign records and the payloads of the campaign entry points

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::customer::MinimalCustomer;

/// Page size used when none (or an out-of-range one) is requested
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest accepted page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Error for text that names no known enum variant
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Delivery channel of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Whatsapp,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Sms, Channel::Whatsapp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "sms",
            Channel::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "channel",
                value: s.to_string(),
            })
    }
}

/// Campaign lifecycle: `draft` -> `scheduled` -> `sending` -> `sent` | `failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 5] = [
        CampaignStatus::Draft,
        CampaignStatus::Scheduled,
        CampaignStatus::Sending,
        CampaignStatus::Sent,
        CampaignStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Scheduled => "scheduled",
            CampaignStatus::Sending => "sending",
            CampaignStatus::Sent => "sent",
            CampaignStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Sent | CampaignStatus::Failed)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CampaignStatus::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "campaign status",
                value: s.to_string(),
            })
    }
}

/// A stored campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub channel: Channel,
    pub status: CampaignStatus,
    /// Template rendered once per customer on send
    pub base_template: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Opaque statistics blob owned by the store
    pub stats: serde_json::Value,
}

/// Fields for a campaign about to be stored
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub channel: Channel,
    pub status: CampaignStatus,
    pub base_template: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Request to create a campaign.
///
/// Fields default to empty so that missing values surface as validation
/// violations instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCampaignRequest {
    #[serde(default)]
    pub name: String,

    /// `sms` or `whatsapp`
    #[serde(default)]
    pub channel: String,

    #[serde(default)]
    pub base_template: String,

    /// RFC 3339 timestamp; a present value moves the campaign to `scheduled`
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

/// Optional listing filters. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignFilter {
    pub status: Option<String>,
    pub channel: Option<String>,
}

impl CampaignFilter {
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| !s.is_empty())
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref().filter(|s| !s.is_empty())
    }
}

/// Normalized listing query handed to the store
#[derive(Debug, Clone)]
pub struct ListCampaignsQuery {
    pub page: i64,
    pub page_size: i64,
    pub filter: CampaignFilter,
}

impl ListCampaignsQuery {
    /// Page numbers start at 1; page sizes outside 1..=100 fall back to the default.
    pub fn new(page: Option<i64>, page_size: Option<i64>, filter: CampaignFilter) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            page,
            page_size,
            filter,
        }
    }

    /// Rows to skip; saturates for page numbers far past the end
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// Campaign as shown in listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub id: i64,
    pub name: String,
    pub channel: Channel,
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Campaign> for CampaignSummary {
    fn from(campaign: &Campaign) -> Self {
        Self {
            id: campaign.id,
            name: campaign.name.clone(),
            channel: campaign.channel,
            status: campaign.status,
            scheduled_at: campaign.scheduled_at,
            created_at: campaign.created_at,
        }
    }
}

/// One page of campaigns as returned by the store, with the unpaged total
#[derive(Debug, Clone, Default)]
pub struct CampaignListing {
    pub items: Vec<CampaignSummary>,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

/// Response for listing campaigns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPage {
    pub data: Vec<CampaignSummary>,
    pub pagination: Pagination,
}

impl CampaignPage {
    pub fn new(query: &ListCampaignsQuery, listing: CampaignListing) -> Self {
        let total_pages = (listing.total_count + query.page_size - 1) / query.page_size;

        Self {
            data: listing.items,
            pagination: Pagination {
                page: query.page,
                page_size: query.page_size,
                total_count: listing.total_count,
                total_pages,
            },
        }
    }
}

/// Request to send a campaign to a list of customers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendCampaignRequest {
    #[serde(default)]
    pub customer_ids: Vec<i64>,
}

/// Outcome of a campaign send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    pub campaign_id: i64,
    /// Customers for which an outbound message row was created
    pub messages_queued: u32,
    /// Always `sending`
    pub status: CampaignStatus,
}

impl SendResult {
    pub fn new(campaign_id: i64, messages_queued: u32) -> Self {
        Self {
            campaign_id,
            messages_queued,
            status: CampaignStatus::Sending,
        }
    }
}

/// Request to preview a personalized message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub customer_id: i64,

    /// Used instead of the campaign's base template when non-empty
    #[serde(default)]
    pub override_template: Option<String>,
}

impl PreviewRequest {
    pub fn override_template(&self) -> Option<&str> {
        self.override_template.as_deref().filter(|t| !t.is_empty())
    }
}

/// Rendered preview with the template actually used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    #[serde(rename = "rendered_message")]
    pub message: String,

    #[serde(rename = "used_template")]
    pub template: String,

    pub customer: MinimalCustomer,
}
