pub mod book_get;
pub mod rating;
pub mod utils;

// Re-export handler functions for use in routing
pub use book_get::book_get;
pub use rating::get as rating_get;
pub use rating::post as rating_post;
pub use rating::put as rating_put;
pub use rating::delete as rating_delete;
