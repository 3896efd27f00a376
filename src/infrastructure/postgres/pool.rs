//! PostgreSQL connection pool.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Errors that can occur with the PostgreSQL pool.
#[derive(Debug, Error)]
pub enum PostgresPoolError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("No database url configured")]
    MissingUrl,
}

/// PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresPool {
    /// The underlying connection pool
    pool: PgPool,

    /// Database URL (for logging purposes)
    database_url: String,
}

impl PostgresPool {
    /// Create a new PostgreSQL pool from configuration.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, PostgresPoolError> {
        if config.url.is_empty() {
            return Err(PostgresPoolError::MissingUrl);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        tracing::info!(
            pool_size = config.pool_size,
            database = %mask_database_url(&config.url),
            "PostgreSQL connection pool created"
        );

        Ok(Self {
            pool,
            database_url: config.url.clone(),
        })
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the database URL (masked for logging).
    pub fn database_url_masked(&self) -> String {
        mask_database_url(&self.database_url)
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

/// Replace the password of a connection URL with `***`.
pub fn mask_database_url(url: &str) -> String {
    let authority_start = url.find("://").map(|i| i + 3).unwrap_or(0);

    if let Some(at_pos) = url[authority_start..].find('@').map(|i| i + authority_start) {
        if let Some(colon_pos) = url[authority_start..at_pos].find(':') {
            let prefix = &url[..authority_start + colon_pos + 1];
            let suffix = &url[at_pos..];
            return format!("{}***{}", prefix, suffix);
        }
    }
    url.to_string()
}
