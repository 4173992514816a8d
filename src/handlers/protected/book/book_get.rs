use axum::extract::{Path, State};

use crate::api::BookView;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::ratings::RatingStore;

use super::utils::parse_book_id;

/// GET /c/book/:book_id - show a single book with its rating aggregate
pub async fn book_get<S: RatingStore>(
    State(state): State<AppState<S>>,
    Path(book_id): Path<String>,
) -> ApiResult<BookView> {
    let book_id = parse_book_id(&book_id)?;
    let view = state.ratings.book(book_id).await?;
    Ok(ApiResponse::success(view))
}
