pub mod memory;
pub mod storage;

pub use memory::{Dataset, InMemoryStore};
pub use storage::pg::PgStore;
