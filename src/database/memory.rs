//! In-process [`RatingStore`] used by the test suite and `--in-memory` runs.
//!
//! A per-book `tokio::sync::Mutex` plays the role of the row lock: a
//! transaction acquires it in `lock_book` and holds it until commit or
//! rollback. Writes are staged on the transaction and applied to the shared
//! tables under a single guard at commit, so readers never observe half of a
//! mutation. Dropping a transaction discards its staged writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::database::models::Book;
use crate::ratings::store::{RatingStore, StoreError};
use crate::ratings::types::{AggregateUpdate, StarRating};

/// Operations that can be made to fail once, for exercising rollback paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    WriteAggregate,
    InsertRating,
    UpdateRating,
    DeleteRating,
    Commit,
    HealthCheck,
}

#[derive(Default)]
struct Tables {
    books: HashMap<i32, Book>,
    ratings: HashMap<(i32, i32), StarRating>,
}

#[derive(Default)]
pub struct MemoryRatingStore {
    tables: Mutex<Tables>,
    book_locks: Mutex<HashMap<i32, Arc<tokio::sync::Mutex<()>>>>,
    fail_point: Mutex<Option<FailPoint>>,
}

/// Transaction scope of [`MemoryRatingStore`]
pub struct MemoryTx {
    held: HashMap<i32, OwnedMutexGuard<()>>,
    books: HashMap<i32, Book>,
    ratings: HashMap<(i32, i32), Option<StarRating>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let store = Self::new();
        for book in books {
            store.insert_book(book);
        }
        store
    }

    pub fn insert_book(&self, book: Book) {
        guard(&self.tables).books.insert(book.id, book);
    }

    /// Writes a rating row directly, without touching the book aggregate
    pub fn seed_rating(&self, account_id: i32, book_id: i32, rating: StarRating) {
        guard(&self.tables).ratings.insert((account_id, book_id), rating);
    }

    /// Committed rating rows of a book as (account_id, rating), ordered by account
    pub fn ratings_for_book(&self, book_id: i32) -> Vec<(i32, StarRating)> {
        let tables = guard(&self.tables);
        let mut rows: Vec<(i32, StarRating)> = tables
            .ratings
            .iter()
            .filter(|((_, book), _)| *book == book_id)
            .map(|(&(account, _), &rating)| (account, rating))
            .collect();
        rows.sort_by_key(|&(account, _)| account);
        rows
    }

    /// Make the next call of `point` fail with a backend error
    pub fn fail_next(&self, point: FailPoint) {
        *guard(&self.fail_point) = Some(point);
    }

    fn trip(&self, point: FailPoint) -> Result<(), StoreError> {
        let mut armed = guard(&self.fail_point);
        if *armed == Some(point) {
            *armed = None;
            return Err(StoreError::Backend(format!("injected failure at {:?}", point)));
        }
        Ok(())
    }

    fn book_lock(&self, book_id: i32) -> Arc<tokio::sync::Mutex<()>> {
        guard(&self.book_locks).entry(book_id).or_default().clone()
    }

    fn current_book(&self, tx: &MemoryTx, book_id: i32) -> Option<Book> {
        match tx.books.get(&book_id) {
            Some(staged) => Some(staged.clone()),
            None => guard(&self.tables).books.get(&book_id).cloned(),
        }
    }

    fn current_rating(&self, tx: &MemoryTx, account_id: i32, book_id: i32) -> Option<StarRating> {
        match tx.ratings.get(&(account_id, book_id)) {
            Some(staged) => *staged,
            None => guard(&self.tables).ratings.get(&(account_id, book_id)).copied(),
        }
    }

    fn require_lock(tx: &MemoryTx, book_id: i32) -> Result<(), StoreError> {
        if tx.held.contains_key(&book_id) {
            Ok(())
        } else {
            Err(StoreError::Backend(format!("book {} is not locked by this transaction", book_id)))
        }
    }
}

#[async_trait]
impl RatingStore for MemoryRatingStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        Ok(MemoryTx {
            held: HashMap::new(),
            books: HashMap::new(),
            ratings: HashMap::new(),
        })
    }

    async fn commit(&self, tx: MemoryTx) -> Result<(), StoreError> {
        self.trip(FailPoint::Commit)?;

        let MemoryTx { held, books, ratings } = tx;
        {
            let mut tables = guard(&self.tables);
            for (id, book) in books {
                tables.books.insert(id, book);
            }
            for (key, rating) in ratings {
                match rating {
                    Some(value) => tables.ratings.insert(key, value),
                    None => tables.ratings.remove(&key),
                };
            }
        }
        drop(held);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<(), StoreError> {
        drop(tx);
        Ok(())
    }

    async fn lock_book(&self, tx: &mut MemoryTx, book_id: i32) -> Result<Option<Book>, StoreError> {
        if self.current_book(tx, book_id).is_none() {
            return Ok(None);
        }
        if !tx.held.contains_key(&book_id) {
            let held = self.book_lock(book_id).lock_owned().await;
            tx.held.insert(book_id, held);
        }
        // Re-read: the previous holder may have committed while we waited
        Ok(self.current_book(tx, book_id))
    }

    async fn get_user_rating(
        &self,
        tx: &mut MemoryTx,
        account_id: i32,
        book_id: i32,
    ) -> Result<Option<StarRating>, StoreError> {
        Ok(self.current_rating(tx, account_id, book_id))
    }

    async fn insert_rating(
        &self,
        tx: &mut MemoryTx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<(), StoreError> {
        self.trip(FailPoint::InsertRating)?;
        Self::require_lock(tx, book_id)?;
        if self.current_book(tx, book_id).is_none() {
            return Err(StoreError::MissingBook(book_id));
        }
        if self.current_rating(tx, account_id, book_id).is_some() {
            return Err(StoreError::Constraint { account_id, book_id, reason: "duplicate rating" });
        }
        tx.ratings.insert((account_id, book_id), Some(rating));
        Ok(())
    }

    async fn update_rating_value(
        &self,
        tx: &mut MemoryTx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<(), StoreError> {
        self.trip(FailPoint::UpdateRating)?;
        Self::require_lock(tx, book_id)?;
        if self.current_rating(tx, account_id, book_id).is_none() {
            return Err(StoreError::Constraint { account_id, book_id, reason: "no rating to update" });
        }
        tx.ratings.insert((account_id, book_id), Some(rating));
        Ok(())
    }

    async fn delete_rating(&self, tx: &mut MemoryTx, account_id: i32, book_id: i32) -> Result<(), StoreError> {
        self.trip(FailPoint::DeleteRating)?;
        Self::require_lock(tx, book_id)?;
        if self.current_rating(tx, account_id, book_id).is_none() {
            return Err(StoreError::Constraint { account_id, book_id, reason: "no rating to delete" });
        }
        tx.ratings.insert((account_id, book_id), None);
        Ok(())
    }

    async fn write_aggregate(
        &self,
        tx: &mut MemoryTx,
        book_id: i32,
        update: &AggregateUpdate,
    ) -> Result<Book, StoreError> {
        self.trip(FailPoint::WriteAggregate)?;
        Self::require_lock(tx, book_id)?;
        let mut book = self
            .current_book(tx, book_id)
            .ok_or(StoreError::MissingBook(book_id))?;
        book.set_aggregate(&update.aggregate);
        tx.books.insert(book_id, book.clone());
        Ok(book)
    }

    async fn fetch_book(&self, book_id: i32) -> Result<Option<Book>, StoreError> {
        Ok(guard(&self.tables).books.get(&book_id).cloned())
    }

    async fn fetch_user_rating(&self, account_id: i32, book_id: i32) -> Result<Option<StarRating>, StoreError> {
        Ok(guard(&self.tables).ratings.get(&(account_id, book_id)).copied())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.trip(FailPoint::HealthCheck)
    }
}

/// A small catalog for running the server without a database
pub fn sample_books() -> Vec<Book> {
    let mut hunger_games = Book::new(1, 9780439023480, "Suzanne Collins", 2008, "The Hunger Games (The Hunger Games, #1)");
    hunger_games.original_title = Some("The Hunger Games".to_string());
    hunger_games.image_url = Some("https://images.gr-assets.com/books/1447303603m/2767052.jpg".to_string());
    hunger_games.image_small_url = Some("https://images.gr-assets.com/books/1447303603s/2767052.jpg".to_string());

    let mut sorcerers_stone = Book::new(2, 9780439554930, "J.K. Rowling, Mary GrandPré", 1997, "Harry Potter and the Sorcerer's Stone (Harry Potter, #1)");
    sorcerers_stone.original_title = Some("Harry Potter and the Philosopher's Stone".to_string());

    let mockingbird = Book::new(4, 9780061120080, "Harper Lee", 1960, "To Kill a Mockingbird");

    vec![hunger_games, sorcerers_stone, mockingbird]
}
