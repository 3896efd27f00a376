//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::dispatch::DispatchStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
    pub dispatch: DispatchHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub pool_size: u32,
    pub idle_connections: u32,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct DispatchHealthResponse {
    pub max_concurrency: usize,
    #[serde(flatten)]
    pub stats: DispatchStatsSnapshot,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let postgres = state.postgres_pool.as_ref().map(|pool| {
        let inner_pool = pool.pool();
        PostgresHealthResponse {
            pool_size: inner_pool.size(),
            idle_connections: inner_pool.num_idle() as u32,
            closed: inner_pool.is_closed(),
        }
    });

    let status = match &postgres {
        Some(pg) if pg.closed => "degraded",
        _ => "healthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreHealthResponse {
            backend: state.service.store().backend_type().to_string(),
            timeout_seconds: state.settings.store.timeout_seconds,
        },
        postgres,
        dispatch: DispatchHealthResponse {
            max_concurrency: state.service.max_concurrency(),
            stats: state.service.dispatch_stats(),
        },
    })
}
