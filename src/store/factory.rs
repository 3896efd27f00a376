//! Store backend factory

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::postgres::PostgresPool;

use super::backend::CampaignStore;
use super::memory_backend::MemoryCampaignStore;
use super::postgres_backend::PostgresCampaignStore;

/// Create a campaign store based on configuration.
///
/// - `"postgres"`: a `PostgresCampaignStore` if a pool is provided
/// - `"memory"` (default): a `MemoryCampaignStore`
///
/// Unknown backends and a postgres backend without a pool fall back to memory.
pub fn create_store(
    settings: &StoreConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> Arc<dyn CampaignStore> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(
                    backend = "postgres",
                    database = %pool.database_url_masked(),
                    "Creating PostgreSQL campaign store"
                );
                Arc::new(PostgresCampaignStore::new(pool.pool().clone()))
            } else {
                tracing::warn!(
                    "PostgreSQL store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryCampaignStore::new())
            }
        }
        "memory" => {
            tracing::info!(backend = "memory", "Creating in-memory campaign store");
            Arc::new(MemoryCampaignStore::new())
        }
        other => {
            tracing::warn!(
                backend = %other,
                "Unknown store backend, falling back to memory"
            );
            Arc::new(MemoryCampaignStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend() {
        let config = StoreConfig::default();
        assert_eq!(create_store(&config, None).backend_type(), "memory");
    }

    #[test]
    fn test_postgres_without_pool_falls_back() {
        let config = StoreConfig {
            backend: "postgres".to_string(),
            ..Default::default()
        };
        assert_eq!(create_store(&config, None).backend_type(), "memory");
    }

    #[test]
    fn test_unknown_backend_falls_back() {
        let config = StoreConfig {
            backend: "redis".to_string(),
            ..Default::default()
        };
        assert_eq!(create_store(&config, None).backend_type(), "memory");
    }
}
