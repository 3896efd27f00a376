// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::config;
pub use infrastructure::error;
pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Domain layer (business logic)
pub mod delivery;
pub mod dispatch;
pub mod domain;
pub mod service;
pub mod store;
pub mod template;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod tasks;
pub mod telemetry;
