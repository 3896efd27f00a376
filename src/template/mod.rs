//! Message template rendering.
//!
//! This module provides:
//! - `FieldValue`: the values a record can expose to a template
//! - `TemplateData`: the capability a record implements to resolve placeholders by name
//! - `render`: the `{FieldName}` substitution engine
//!
//! # Example
//!
//! ```ignore
//! let customer = store.get_customer(10).await?;
//!
//! // "Hi {FirstName}" -> "Hi Ann"
//! let message = render(&campaign.base_template, Some(&customer));
//! ```

mod substitution;
mod types;

pub use substitution::render;
pub use types::{format_timestamp, FieldValue, TemplateData};
