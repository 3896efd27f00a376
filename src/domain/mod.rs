//! Domain layer modules
//!
//! This module contains the campaign messaging domain:
//! - `campaign`: Campaigns, listing, send and preview payloads
//! - `customer`: Customers and their template fields
//! - `message`: Outbound message rows
//! - `validation`: Request validation with per-field violations

pub mod campaign;
pub mod customer;
pub mod message;
pub mod validation;

pub use campaign::{
    Campaign, CampaignFilter, CampaignListing, CampaignPage, CampaignStatus, CampaignSummary,
    Channel, CreateCampaignRequest, ListCampaignsQuery, NewCampaign, Pagination, ParseEnumError,
    PreviewRequest, PreviewResponse, SendCampaignRequest, SendResult,
};
pub use customer::{Customer, MinimalCustomer, NewCustomer};
pub use message::{MessageStatus, NewOutboundMessage, OutboundMessage};
pub use validation::{Validate, ValidationErrors, Violation};
