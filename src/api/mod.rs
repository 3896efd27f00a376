//! API layer - HTTP endpoint handlers.

mod campaign;
mod health;
mod metrics;
mod routes;

pub use campaign::{
    create_campaign, get_campaign, list_campaigns, preview_message, send_campaign,
    ListCampaignsParams,
};
pub use health::{health, HealthResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
