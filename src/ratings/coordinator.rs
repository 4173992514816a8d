//! Transactional orchestration of rating mutations.
//!
//! Each operation runs as one transaction: lock the book row, inspect the
//! caller's existing rating, recompute the aggregate, then write the aggregate
//! and the rating row. Success commits; any error rolls back before it is
//! returned, so the aggregate and the rating rows never diverge. The book-row
//! lock serializes all mutations of a single book.

use tracing::{debug, error};

use crate::database::models::Book;
use super::aggregate;
use super::error::RatingError;
use super::store::RatingStore;
use super::types::StarRating;

pub struct RatingCoordinator<S> {
    store: S,
}

impl<S: RatingStore> RatingCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a first rating of `book_id` by `account_id`
    pub async fn add(&self, account_id: i32, book_id: i32, rating: StarRating) -> Result<Book, RatingError> {
        let mut tx = self.store.begin().await?;
        let outcome = self.add_in_tx(&mut tx, account_id, book_id, rating).await;
        self.finish(tx, outcome).await
    }

    /// Replace an existing rating with a different value
    pub async fn update(&self, account_id: i32, book_id: i32, rating: StarRating) -> Result<Book, RatingError> {
        let mut tx = self.store.begin().await?;
        let outcome = self.update_in_tx(&mut tx, account_id, book_id, rating).await;
        self.finish(tx, outcome).await
    }

    pub async fn remove(&self, account_id: i32, book_id: i32) -> Result<Book, RatingError> {
        let mut tx = self.store.begin().await?;
        let outcome = self.remove_in_tx(&mut tx, account_id, book_id).await;
        self.finish(tx, outcome).await
    }

    async fn add_in_tx(
        &self,
        tx: &mut S::Tx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<Book, RatingError> {
        let book = self.lock(tx, book_id).await?;

        if let Some(previous) = self.store.get_user_rating(tx, account_id, book_id).await? {
            return Err(RatingError::AlreadyRated { book_id, previous });
        }

        let update = aggregate::apply_add(&book.aggregate(), rating)
            .map_err(|source| RatingError::CorruptAggregate { book_id, source })?;
        let updated = self.store.write_aggregate(tx, book_id, &update).await?;
        self.store.insert_rating(tx, account_id, book_id, rating).await?;

        Ok(updated)
    }

    async fn update_in_tx(
        &self,
        tx: &mut S::Tx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<Book, RatingError> {
        let book = self.lock(tx, book_id).await?;

        let previous = self
            .store
            .get_user_rating(tx, account_id, book_id)
            .await?
            .ok_or(RatingError::NoPriorRating { book_id })?;

        if previous == rating {
            return Err(RatingError::NoChange { book_id, rating });
        }

        let update = aggregate::apply_change(&book.aggregate(), previous, rating)
            .map_err(|source| RatingError::CorruptAggregate { book_id, source })?;
        let updated = self.store.write_aggregate(tx, book_id, &update).await?;
        self.store.update_rating_value(tx, account_id, book_id, rating).await?;

        Ok(updated)
    }

    async fn remove_in_tx(&self, tx: &mut S::Tx, account_id: i32, book_id: i32) -> Result<Book, RatingError> {
        let book = self.lock(tx, book_id).await?;

        let previous = self
            .store
            .get_user_rating(tx, account_id, book_id)
            .await?
            .ok_or(RatingError::NoPriorRating { book_id })?;

        let update = aggregate::apply_remove(&book.aggregate(), previous)
            .map_err(|source| RatingError::CorruptAggregate { book_id, source })?;
        let updated = self.store.write_aggregate(tx, book_id, &update).await?;
        self.store.delete_rating(tx, account_id, book_id).await?;

        Ok(updated)
    }

    async fn lock(&self, tx: &mut S::Tx, book_id: i32) -> Result<Book, RatingError> {
        self.store
            .lock_book(tx, book_id)
            .await?
            .ok_or(RatingError::BookNotFound { book_id })
    }

    /// Commit on success, roll back on failure
    async fn finish<T>(&self, tx: S::Tx, outcome: Result<T, RatingError>) -> Result<T, RatingError> {
        match outcome {
            Ok(value) => {
                self.store.commit(tx).await?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "Rolling back rating transaction");
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    // The original error is what the caller needs to see
                    error!(error = %rollback_err, "Rating transaction rollback failed");
                }
                Err(err)
            }
        }
    }
}
