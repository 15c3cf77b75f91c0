pub mod loader;
pub mod schema;

pub use loader::{get_config_path, get_ponte_home, load_config};
pub use schema::{
    CacheConfig, Config, DeliveryConfig, GatewayConfig, PipelineConfig, ProviderConfig,
    ProviderKind, QueueConfig, SessionConfig,
};
