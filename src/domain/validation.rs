//! Request validation.
//!
//! Every entry point validates its input before touching the store. Failures are
//! reported as a list of per-field violations rather than a single message.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::campaign::{
    CampaignStatus, Channel, CreateCampaignRequest, NewCampaign, PreviewRequest,
    SendCampaignRequest,
};

/// A single invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// All violations found in one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Names of the invalid fields, in the order they were found
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", violation.field, violation.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Input that can be checked before any store interaction
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Parse an RFC 3339 timestamp such as `2025-01-15T09:00:00Z`
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl CreateCampaignRequest {
    fn parse(&self) -> Result<(Channel, Option<DateTime<Utc>>), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.is_empty() {
            errors.add("name", "is required");
        }

        let channel = if self.channel.is_empty() {
            errors.add("channel", "is required");
            None
        } else {
            match self.channel.parse::<Channel>() {
                Ok(channel) => Some(channel),
                Err(_) => {
                    errors.add("channel", "must be one of: sms, whatsapp");
                    None
                }
            }
        };

        if self.base_template.is_empty() {
            errors.add("base_template", "is required");
        }

        let scheduled_at = match self.scheduled_at.as_deref().filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => {
                let parsed = parse_timestamp(raw);
                if parsed.is_none() {
                    errors.add("scheduled_at", "must be an RFC 3339 timestamp");
                }
                parsed
            }
        };

        match channel {
            Some(channel) if errors.is_empty() => Ok((channel, scheduled_at)),
            _ => Err(errors),
        }
    }

    /// Validate and convert into the fields to store.
    ///
    /// A campaign with a schedule starts as `scheduled`, otherwise as `draft`.
    pub fn into_new_campaign(self) -> Result<NewCampaign, ValidationErrors> {
        let (channel, scheduled_at) = self.parse()?;
        let status = if scheduled_at.is_some() {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Draft
        };

        Ok(NewCampaign {
            name: self.name,
            channel,
            status,
            base_template: self.base_template,
            scheduled_at,
        })
    }
}

impl Validate for CreateCampaignRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.parse().map(|_| ())
    }
}

impl Validate for SendCampaignRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.customer_ids.is_empty() {
            errors.add("customer_ids", "must contain at least one customer id");
        }
        errors.into_result()
    }
}

impl Validate for PreviewRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.customer_id == 0 {
            errors.add("customer_id", "is required");
        }
        errors.into_result()
    }
}
