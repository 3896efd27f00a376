//! Outbound message rows created by a campaign send

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::campaign::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            _ => Err(ParseEnumError {
                kind: "message status",
                value: s.to_string(),
            }),
        }
    }
}

/// A personalized message waiting for delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub id: i64,
    pub campaign_id: i64,
    pub customer_id: i64,
    pub status: MessageStatus,
    pub rendered_content: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for an outbound message about to be stored
#[derive(Debug, Clone)]
pub struct NewOutboundMessage {
    pub campaign_id: i64,
    pub customer_id: i64,
    pub status: MessageStatus,
    pub rendered_content: String,
}

impl NewOutboundMessage {
    /// A `pending` message for one customer of a campaign
    pub fn pending(campaign_id: i64, customer_id: i64, rendered_content: String) -> Self {
        Self {
            campaign_id,
            customer_id,
            status: MessageStatus::Pending,
            rendered_content,
        }
    }
}
