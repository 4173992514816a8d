pub mod aggregate;
pub mod coordinator;
pub mod error;
pub mod store;
pub mod types;

pub use coordinator::RatingCoordinator;
pub use error::RatingError;
pub use store::{RatingStore, StoreError};
pub use types::{Aggregate, AggregateUpdate, Histogram, StarDelta, StarRating};
