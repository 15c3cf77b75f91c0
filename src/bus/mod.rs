pub mod events;
pub mod queue;

pub use events::{InboundEvent, Job};
pub use queue::JobQueue;
