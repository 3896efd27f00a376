use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::delivery::DeliveryNotifier;
use crate::postgres::PostgresPool;
use crate::service::CampaignService;
use crate::store::CampaignStore;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub service: Arc<CampaignService>,
    pub postgres_pool: Option<Arc<PostgresPool>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Arc<dyn CampaignStore>,
        notifier: Arc<dyn DeliveryNotifier>,
        postgres_pool: Option<Arc<PostgresPool>>,
    ) -> Self {
        let service = Arc::new(CampaignService::new(
            store,
            notifier,
            &settings.dispatch,
            settings.store.timeout(),
        ));

        Self {
            settings: Arc::new(settings),
            service,
            postgres_pool,
            start_time: Instant::now(),
        }
    }
}
