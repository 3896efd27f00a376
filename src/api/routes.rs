use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::campaign::{
    create_campaign, get_campaign, list_campaigns, preview_message, send_campaign,
};
use super::health::health;
use super::metrics::prometheus_metrics;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Campaigns
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route("/campaigns/{id}", get(get_campaign))
        .route("/campaigns/{id}/send", post(send_campaign))
        .route("/campaigns/{id}/personalized-preview", post(preview_message))
}
