//! Campaign service: validated entry points over the store and the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use crate::config::DispatchConfig;
use crate::delivery::DeliveryNotifier;
use crate::dispatch::{DispatchCoordinator, DispatchStatsSnapshot};
use crate::domain::{
    Campaign, CampaignFilter, CampaignPage, CreateCampaignRequest, ListCampaignsQuery,
    MinimalCustomer, PreviewRequest, PreviewResponse, SendCampaignRequest, SendResult, Validate,
};
use crate::error::Result;
use crate::metrics::{DispatchMetrics, PreviewMetrics};
use crate::store::{with_timeout, CampaignStore};
use crate::template::render;

pub struct CampaignService {
    store: Arc<dyn CampaignStore>,
    dispatcher: DispatchCoordinator,
    store_timeout: Duration,
}

impl CampaignService {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        notifier: Arc<dyn DeliveryNotifier>,
        dispatch: &DispatchConfig,
        store_timeout: Duration,
    ) -> Self {
        let dispatcher = DispatchCoordinator::new(store.clone(), notifier, dispatch, store_timeout);

        Self {
            store,
            dispatcher,
            store_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn CampaignStore> {
        &self.store
    }

    /// Concurrency ceiling in force for sends
    pub fn max_concurrency(&self) -> usize {
        self.dispatcher.max_concurrency()
    }

    pub fn dispatch_stats(&self) -> DispatchStatsSnapshot {
        self.dispatcher.stats()
    }

    /// Create a campaign in `draft`, or `scheduled` when a schedule is given.
    #[tracing::instrument(name = "service.add_campaign", skip_all, fields(name = %request.name))]
    pub async fn add_campaign(&self, request: CreateCampaignRequest) -> Result<Campaign> {
        let new_campaign = request.into_new_campaign()?;

        let campaign = with_timeout(self.store_timeout, self.store.add_campaign(new_campaign)).await?;

        tracing::info!(
            campaign_id = campaign.id,
            channel = %campaign.channel,
            status = %campaign.status,
            "Campaign created"
        );

        Ok(campaign)
    }

    #[tracing::instrument(name = "service.list_campaigns", skip(self, filter))]
    pub async fn list_campaigns(
        &self,
        page: Option<i64>,
        page_size: Option<i64>,
        filter: CampaignFilter,
    ) -> Result<CampaignPage> {
        let query = ListCampaignsQuery::new(page, page_size, filter);
        let listing = with_timeout(self.store_timeout, self.store.list_campaigns(&query)).await?;

        Ok(CampaignPage::new(&query, listing))
    }

    #[tracing::instrument(name = "service.retrieve_campaign", skip(self))]
    pub async fn retrieve_campaign(&self, id: i64) -> Result<Campaign> {
        Ok(with_timeout(self.store_timeout, self.store.get_campaign(id)).await?)
    }

    /// Render a campaign's message for one customer without writing anything.
    ///
    /// A non-empty override template is used as is and the campaign is not looked up.
    #[tracing::instrument(
        name = "service.preview_message",
        skip_all,
        fields(campaign_id = campaign_id, customer_id = request.customer_id)
    )]
    pub async fn preview_message(
        &self,
        campaign_id: i64,
        request: PreviewRequest,
    ) -> Result<PreviewResponse> {
        request.validate()?;

        let template = match request.override_template() {
            Some(template) => template.to_string(),
            None => {
                with_timeout(self.store_timeout, self.store.get_campaign(campaign_id))
                    .await?
                    .base_template
            }
        };

        let customer =
            with_timeout(self.store_timeout, self.store.get_customer(request.customer_id)).await?;

        let message = render(&template, Some(&customer));
        PreviewMetrics::record_preview();

        Ok(PreviewResponse {
            message,
            template,
            customer: MinimalCustomer::from(&customer),
        })
    }

    /// Queue one personalized message per customer.
    #[tracing::instrument(
        name = "service.send_campaign",
        skip_all,
        fields(campaign_id = campaign_id, customers = request.customer_ids.len())
    )]
    pub async fn send_campaign(
        &self,
        campaign_id: i64,
        request: SendCampaignRequest,
    ) -> Result<SendResult> {
        if let Err(errors) = request.validate() {
            DispatchMetrics::record_rejected();
            return Err(errors.into());
        }

        self.dispatcher.send(campaign_id, &request.customer_ids).await
    }
}
