mod settings;

pub use settings::{
    DatabaseConfig, DispatchConfig, OtelConfig, ServerConfig, Settings, StoreConfig,
};
