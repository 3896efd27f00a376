//! Campaign endpoints.

use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::domain::{
    Campaign, CampaignFilter, CampaignPage, CreateCampaignRequest, PreviewRequest,
    PreviewResponse, SendCampaignRequest, SendResult, ValidationErrors,
};
use crate::error::{AppError, Result};
use crate::server::AppState;

/// Query string of `GET /campaigns`
#[derive(Debug, Default, Deserialize)]
pub struct ListCampaignsParams {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub channel: Option<String>,
}

fn campaign_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    match path {
        Ok(Path(id)) => Ok(id),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Invalid campaign id in path");
            let mut errors = ValidationErrors::new();
            errors.add("id", "must be an integer");
            Err(AppError::Validation(errors))
        }
    }
}

/// GET /campaigns - List campaigns, newest first
#[tracing::instrument(name = "http.list_campaigns", skip_all)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(params): Query<ListCampaignsParams>,
) -> Result<Json<CampaignPage>> {
    let filter = CampaignFilter {
        status: params.status,
        channel: params.channel,
    };

    let page = state
        .service
        .list_campaigns(params.page_number, params.page_size, filter)
        .await?;

    Ok(Json(page))
}

/// POST /campaigns - Create a campaign
#[tracing::instrument(name = "http.create_campaign", skip_all)]
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(request): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>)> {
    let campaign = state.service.add_campaign(request).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /campaigns/{id} - Retrieve one campaign
#[tracing::instrument(name = "http.get_campaign", skip_all)]
pub async fn get_campaign(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Campaign>> {
    let id = campaign_id(path)?;
    Ok(Json(state.service.retrieve_campaign(id).await?))
}

/// POST /campaigns/{id}/send - Queue one message per customer
#[tracing::instrument(name = "http.send_campaign", skip_all)]
pub async fn send_campaign(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    Json(request): Json<SendCampaignRequest>,
) -> Result<Json<SendResult>> {
    let id = campaign_id(path)?;
    Ok(Json(state.service.send_campaign(id, request).await?))
}

/// POST /campaigns/{id}/personalized-preview - Render for one customer
#[tracing::instrument(name = "http.preview_message", skip_all)]
pub async fn preview_message(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    Json(request): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>> {
    let id = campaign_id(path)?;
    Ok(Json(state.service.preview_message(id, request).await?))
}
