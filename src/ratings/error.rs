use thiserror::Error;

use super::aggregate::AggregateError;
use super::store::StoreError;
use super::types::StarRating;

/// Outcomes of a rating mutation other than success
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("{0}")]
    Validation(String),

    #[error("Book not found.")]
    BookNotFound { book_id: i32 },

    #[error("User has not rated this book.")]
    NoPriorRating { book_id: i32 },

    #[error("This user has already rated this book.")]
    AlreadyRated { book_id: i32, previous: StarRating },

    #[error("New rating is the same as the previous rating.")]
    NoChange { book_id: i32, rating: StarRating },

    #[error("rating aggregate of book {book_id} is inconsistent: {source}")]
    CorruptAggregate { book_id: i32, source: AggregateError },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RatingError {
    /// Domain conflicts are reported verbatim; everything else is an internal failure
    pub fn is_conflict(&self) -> bool {
        !matches!(self, RatingError::CorruptAggregate { .. } | RatingError::Storage(_))
    }
}
