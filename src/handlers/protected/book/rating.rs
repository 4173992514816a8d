use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::api::{BookView, UserRatingView};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::ratings::RatingStore;
use crate::services::RatingOutcome;

use super::utils::{body_rejection, parse_book_id, RatingBody};

fn respond(outcome: RatingOutcome) -> ApiResponse<BookView> {
    ApiResponse::success(outcome.data).with_message(outcome.message)
}

/// GET /c/book/:book_id/rating - the caller's rating of a book
pub async fn get<S: RatingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(book_id): Path<String>,
) -> ApiResult<UserRatingView> {
    let book_id = parse_book_id(&book_id)?;
    let view = state.ratings.user_rating(user.account_id, book_id).await?;
    Ok(ApiResponse::success(view))
}

/// POST /c/book/:book_id/rating - add the caller's first rating
pub async fn post<S: RatingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(book_id): Path<String>,
    body: Result<Json<RatingBody>, JsonRejection>,
) -> ApiResult<BookView> {
    let book_id = parse_book_id(&book_id)?;
    let Json(body) = body.map_err(body_rejection)?;

    let outcome = state
        .ratings
        .add_rating(user.account_id, book_id, body.rating.as_ref())
        .await?;

    Ok(ApiResponse::created(outcome.data).with_message(outcome.message))
}

/// PUT /c/book/:book_id/rating - change the caller's existing rating
pub async fn put<S: RatingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(book_id): Path<String>,
    body: Result<Json<RatingBody>, JsonRejection>,
) -> ApiResult<BookView> {
    let book_id = parse_book_id(&book_id)?;
    let Json(body) = body.map_err(body_rejection)?;

    let outcome = state
        .ratings
        .update_rating(user.account_id, book_id, body.rating.as_ref())
        .await?;

    Ok(respond(outcome))
}

/// DELETE /c/book/:book_id/rating - withdraw the caller's rating
pub async fn delete<S: RatingStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(book_id): Path<String>,
) -> ApiResult<BookView> {
    let book_id = parse_book_id(&book_id)?;
    let outcome = state.ratings.remove_rating(user.account_id, book_id).await?;
    Ok(respond(outcome))
}
