pub mod memory;
pub mod store;

pub use memory::InMemorySessionStore;
pub use store::{Session, SessionStore, Turn};
