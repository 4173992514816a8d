use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;

/// Body of POST/PUT `/c/book/:book_id/rating`.
///
/// `rating` stays untyped so the service can tell a missing value from a
/// malformed one.
#[derive(Debug, Default, Deserialize)]
pub struct RatingBody {
    pub rating: Option<Value>,
}

/// Parse the `:book_id` path segment
pub fn parse_book_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::bad_request("Book ID must be a number."))
}

/// Map an axum JSON extraction failure onto the API envelope
pub fn body_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected request body: {}", rejection.body_text());
    ApiError::bad_request(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_parse() {
        assert_eq!(parse_book_id("42").unwrap(), 42);
        assert_eq!(parse_book_id(" 7 ").unwrap(), 7);
    }

    #[test]
    fn non_numeric_ids_are_bad_requests() {
        for raw in ["abc", "4.5", "", "99999999999"] {
            let err = parse_book_id(raw).unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
            assert_eq!(err.message(), "Book ID must be a number.");
        }
    }
}
