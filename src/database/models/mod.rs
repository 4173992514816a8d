pub mod book;
pub mod rating;

pub use book::Book;
pub use rating::Rating;
