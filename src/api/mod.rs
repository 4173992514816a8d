pub mod format;

pub use format::{BookView, IconsView, RatingsView, UserRatingView};
