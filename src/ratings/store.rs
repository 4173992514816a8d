use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::Book;
use super::types::{AggregateUpdate, StarRating};

/// Errors raised by a [`RatingStore`] backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("stored rating {value} for account {account_id} on book {book_id} is out of range")]
    InvalidStoredRating { account_id: i32, book_id: i32, value: i64 },

    #[error("book {0} does not exist")]
    MissingBook(i32),

    #[error("rating constraint violated for account {account_id} on book {book_id}: {reason}")]
    Constraint { account_id: i32, book_id: i32, reason: &'static str },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Rating rows and book aggregates, mutated only inside a caller-owned transaction.
///
/// `begin`, `commit` and `rollback` delimit the transaction scope. The row
/// operations take that scope as `tx` and never open or close one themselves;
/// every mutating call assumes the caller already holds the book lock from
/// [`RatingStore::lock_book`].
#[async_trait]
pub trait RatingStore: Send + Sync + 'static {
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Exclusive lock on the book row until the transaction ends, `None` if no such book
    async fn lock_book(&self, tx: &mut Self::Tx, book_id: i32) -> Result<Option<Book>, StoreError>;

    async fn get_user_rating(
        &self,
        tx: &mut Self::Tx,
        account_id: i32,
        book_id: i32,
    ) -> Result<Option<StarRating>, StoreError>;

    async fn insert_rating(
        &self,
        tx: &mut Self::Tx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<(), StoreError>;

    async fn update_rating_value(
        &self,
        tx: &mut Self::Tx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<(), StoreError>;

    async fn delete_rating(&self, tx: &mut Self::Tx, account_id: i32, book_id: i32) -> Result<(), StoreError>;

    /// Persist count, average and histogram delta, returning the book row as written
    async fn write_aggregate(
        &self,
        tx: &mut Self::Tx,
        book_id: i32,
        update: &AggregateUpdate,
    ) -> Result<Book, StoreError>;

    /// Committed book state, outside any transaction
    async fn fetch_book(&self, book_id: i32) -> Result<Option<Book>, StoreError>;

    /// Committed rating of one account for one book, outside any transaction
    async fn fetch_user_rating(&self, account_id: i32, book_id: i32) -> Result<Option<StarRating>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
