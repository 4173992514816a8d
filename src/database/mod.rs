pub mod manager;
pub mod memory;
pub mod models;
pub mod rating_store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryRatingStore;
pub use rating_store::PgRatingStore;
