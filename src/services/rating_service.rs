use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{BookView, UserRatingView};
use crate::ratings::{RatingCoordinator, RatingError, RatingStore, StarRating, StoreError};

pub const RATING_MISSING: &str = "Rating is not provided in body";
pub const RATING_INVALID: &str = "Rating must be an integer between [1, 5]";

/// Result of a successful rating mutation as returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct RatingOutcome {
    pub message: &'static str,
    pub data: BookView,
}

impl RatingOutcome {
    fn new(message: &'static str, data: BookView) -> Self {
        Self { message, data }
    }
}

/// Entry point of the rating subsystem for the HTTP layer
pub struct RatingService<S> {
    coordinator: RatingCoordinator<S>,
}

impl<S: RatingStore> RatingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            coordinator: RatingCoordinator::new(store),
        }
    }

    pub fn store(&self) -> &S {
        self.coordinator.store()
    }

    /// Validate the raw `rating` field of a request body.
    ///
    /// Accepts JSON numbers with an integral value in 1..=5 (`4` and `4.0`).
    /// Empty values (absent, `null`, `0`, `false`, `""`) count as not provided;
    /// any other string, boolean or fractional number is rejected.
    pub fn parse_rating(raw: Option<&Value>) -> Result<StarRating, RatingError> {
        if raw.map_or(true, is_empty_value) {
            return Err(RatingError::Validation(RATING_MISSING.to_string()));
        }
        let number = match raw {
            Some(Value::Number(number)) => number,
            _ => return Err(RatingError::Validation(RATING_INVALID.to_string())),
        };

        let integral = match number.as_i64() {
            Some(value) => Some(value),
            None => number
                .as_f64()
                .filter(|value| value.fract() == 0.0 && value.abs() <= i64::MAX as f64)
                .map(|value| value as i64),
        };

        integral
            .and_then(|value| StarRating::new(value).ok())
            .ok_or_else(|| RatingError::Validation(RATING_INVALID.to_string()))
    }

    pub async fn add_rating(
        &self,
        account_id: i32,
        book_id: i32,
        rating: Option<&Value>,
    ) -> Result<RatingOutcome, RatingError> {
        let rating = Self::parse_rating(rating)?;
        let book = self
            .coordinator
            .add(account_id, book_id, rating)
            .await
            .inspect_err(|err| log_failure("add", account_id, book_id, err))?;

        info!(account_id, book_id, rating = rating.value(), count = book.rating_count, "Rating added");
        Ok(RatingOutcome::new("Rating added.", BookView::from(book)))
    }

    pub async fn update_rating(
        &self,
        account_id: i32,
        book_id: i32,
        rating: Option<&Value>,
    ) -> Result<RatingOutcome, RatingError> {
        let rating = Self::parse_rating(rating)?;
        let book = self
            .coordinator
            .update(account_id, book_id, rating)
            .await
            .inspect_err(|err| log_failure("update", account_id, book_id, err))?;

        info!(account_id, book_id, rating = rating.value(), "Rating updated");
        Ok(RatingOutcome::new("Rating updated.", BookView::from(book)))
    }

    pub async fn remove_rating(&self, account_id: i32, book_id: i32) -> Result<RatingOutcome, RatingError> {
        let book = self
            .coordinator
            .remove(account_id, book_id)
            .await
            .inspect_err(|err| log_failure("remove", account_id, book_id, err))?;

        info!(account_id, book_id, count = book.rating_count, "Rating removed");
        Ok(RatingOutcome::new("Rating removed.", BookView::from(book)))
    }

    pub async fn book(&self, book_id: i32) -> Result<BookView, RatingError> {
        self.store()
            .fetch_book(book_id)
            .await?
            .map(BookView::from)
            .ok_or(RatingError::BookNotFound { book_id })
    }

    pub async fn user_rating(&self, account_id: i32, book_id: i32) -> Result<UserRatingView, RatingError> {
        if self.store().fetch_book(book_id).await?.is_none() {
            return Err(RatingError::BookNotFound { book_id });
        }

        self.store()
            .fetch_user_rating(account_id, book_id)
            .await?
            .map(|rating| UserRatingView { book_id, rating })
            .ok_or(RatingError::NoPriorRating { book_id })
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        self.store().health_check().await
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn log_failure(operation: &str, account_id: i32, book_id: i32, err: &RatingError) {
    if err.is_conflict() {
        debug!(operation, account_id, book_id, "Rating {} rejected: {}", operation, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{sample_books, MemoryRatingStore};
    use serde_json::json;

    type Service = RatingService<MemoryRatingStore>;

    fn validation_message(raw: Option<&Value>) -> String {
        match Service::parse_rating(raw) {
            Err(RatingError::Validation(message)) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn parse_accepts_integral_numbers() {
        assert_eq!(Service::parse_rating(Some(&json!(1))).unwrap().value(), 1);
        assert_eq!(Service::parse_rating(Some(&json!(5.0))).unwrap().value(), 5);
    }

    #[test]
    fn parse_reports_missing_rating() {
        assert_eq!(validation_message(None), RATING_MISSING);
        assert_eq!(validation_message(Some(&Value::Null)), RATING_MISSING);
    }

    #[test]
    fn parse_treats_zero_and_empty_values_as_missing() {
        for raw in [json!(0), json!(0.0), json!(false), json!("")] {
            assert_eq!(validation_message(Some(&raw)), RATING_MISSING, "input {raw}");
        }
    }

    #[test]
    fn parse_rejects_non_integers_and_out_of_range() {
        for raw in [json!(6), json!(-1), json!(3.5), json!("4"), json!(true), json!([4])] {
            assert_eq!(validation_message(Some(&raw)), RATING_INVALID, "input {raw}");
        }
    }

    #[tokio::test]
    async fn invalid_rating_never_reaches_the_store() {
        let service = Service::new(MemoryRatingStore::with_books(sample_books()));
        let err = service.add_rating(1, 404, Some(&json!(9))).await.unwrap_err();
        assert!(matches!(err, RatingError::Validation(_)));
    }

    #[tokio::test]
    async fn outcome_carries_book_view() {
        let service = Service::new(MemoryRatingStore::with_books(sample_books()));
        let outcome = service.add_rating(1, 1, Some(&json!(5))).await.unwrap();
        assert_eq!(outcome.message, "Rating added.");
        assert_eq!(outcome.data.isbn13, "9780439023480");
        assert_eq!(outcome.data.ratings.count, 1);
        assert_eq!(outcome.data.ratings.rating_5, 1);

        let view = service.user_rating(1, 1).await.unwrap();
        assert_eq!(view.rating.value(), 5);
    }

    #[tokio::test]
    async fn user_rating_distinguishes_missing_book_from_missing_rating() {
        let service = Service::new(MemoryRatingStore::with_books(sample_books()));
        assert!(matches!(
            service.user_rating(1, 404).await,
            Err(RatingError::BookNotFound { book_id: 404 })
        ));
        assert!(matches!(
            service.user_rating(1, 2).await,
            Err(RatingError::NoPriorRating { book_id: 2 })
        ));
    }
}
