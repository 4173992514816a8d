use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::models::book::BOOK_COLUMNS;
use crate::database::models::{Book, Rating};
use crate::ratings::store::{RatingStore, StoreError};
use crate::ratings::types::{AggregateUpdate, StarDelta, StarRating};

/// PostgreSQL-backed [`RatingStore`]; the book-row lock is `SELECT ... FOR UPDATE`
#[derive(Clone)]
pub struct PgRatingStore {
    pool: PgPool,
}

impl PgRatingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// UPDATE statement for an aggregate write: $1 count, $2 average, $3 book id.
/// Histogram cells are adjusted relative to their locked value.
fn aggregate_update_sql(delta: &StarDelta) -> String {
    let mut assignments = vec!["rating_count = $1".to_string(), "rating_avg = $2".to_string()];
    if let Some(star) = delta.removed {
        assignments.push(format!("{0} = {0} - 1", star.column()));
    }
    if let Some(star) = delta.added {
        assignments.push(format!("{0} = {0} + 1", star.column()));
    }
    format!(
        "UPDATE books SET {} WHERE id = $3 RETURNING {}",
        assignments.join(", "),
        BOOK_COLUMNS
    )
}

fn to_star(row: Rating) -> Result<StarRating, StoreError> {
    row.star().map_err(|invalid| StoreError::InvalidStoredRating {
        account_id: row.account_id,
        book_id: row.book_id,
        value: invalid.0,
    })
}

#[async_trait]
impl RatingStore for PgRatingStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.rollback().await?;
        Ok(())
    }

    async fn lock_book(&self, tx: &mut Self::Tx, book_id: i32) -> Result<Option<Book>, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE id = $1 FOR UPDATE", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(book_id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(book)
    }

    async fn get_user_rating(
        &self,
        tx: &mut Self::Tx,
        account_id: i32,
        book_id: i32,
    ) -> Result<Option<StarRating>, StoreError> {
        let row = sqlx::query_as::<_, Rating>(
            "SELECT account_id, book_id, rating FROM ratings WHERE account_id = $1 AND book_id = $2",
        )
        .bind(account_id)
        .bind(book_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(to_star).transpose()
    }

    async fn insert_rating(
        &self,
        tx: &mut Self::Tx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO ratings (account_id, book_id, rating) VALUES ($1, $2, $3)")
            .bind(account_id)
            .bind(book_id)
            .bind(i16::from(rating))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    async fn update_rating_value(
        &self,
        tx: &mut Self::Tx,
        account_id: i32,
        book_id: i32,
        rating: StarRating,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE ratings SET rating = $1 WHERE account_id = $2 AND book_id = $3")
            .bind(i16::from(rating))
            .bind(account_id)
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Constraint { account_id, book_id, reason: "no rating to update" });
        }
        Ok(())
    }

    async fn delete_rating(&self, tx: &mut Self::Tx, account_id: i32, book_id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM ratings WHERE account_id = $1 AND book_id = $2")
            .bind(account_id)
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Constraint { account_id, book_id, reason: "no rating to delete" });
        }
        Ok(())
    }

    async fn write_aggregate(
        &self,
        tx: &mut Self::Tx,
        book_id: i32,
        update: &AggregateUpdate,
    ) -> Result<Book, StoreError> {
        let sql = aggregate_update_sql(&update.delta);
        sqlx::query_as::<_, Book>(&sql)
            .bind(update.aggregate.count)
            .bind(update.aggregate.average)
            .bind(book_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(StoreError::MissingBook(book_id))
    }

    async fn fetch_book(&self, book_id: i32) -> Result<Option<Book>, StoreError> {
        let sql = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn fetch_user_rating(&self, account_id: i32, book_id: i32) -> Result<Option<StarRating>, StoreError> {
        let row = sqlx::query_as::<_, Rating>(
            "SELECT account_id, book_id, rating FROM ratings WHERE account_id = $1 AND book_id = $2",
        )
        .bind(account_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(to_star).transpose()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
