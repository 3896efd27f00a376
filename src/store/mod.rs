//! Campaign persistence.
//!
//! - `backend`: the `CampaignStore` trait and `StoreError`
//! - `memory_backend`: DashMap-backed store (default, tests)
//! - `postgres_backend`: sqlx-backed store
//! - `factory`: picks a backend from configuration

mod backend;
mod factory;
mod memory_backend;
mod postgres_backend;

use std::future::Future;
use std::time::Duration;

pub use backend::{CampaignStore, StoreError};
pub use factory::create_store;
pub use memory_backend::MemoryCampaignStore;
pub use postgres_backend::PostgresCampaignStore;

/// Run a store call with an upper bound on its duration.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
