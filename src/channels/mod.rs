pub mod base;
pub mod evolution;

pub use base::DeliveryChannel;
pub use evolution::EvolutionClient;
