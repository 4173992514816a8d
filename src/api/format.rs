//! Client-facing shapes of storage records.
//!
//! Rows are never serialized directly; these views rename the storage
//! columns into the API vocabulary (`publication`, `ratings`, `icons`).

use serde::{Deserialize, Serialize};

use crate::database::models::Book;
use crate::ratings::StarRating;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookView {
    pub isbn13: String,
    pub authors: String,
    pub publication: i32,
    pub original_title: Option<String>,
    pub title: String,
    pub ratings: RatingsView,
    pub icons: IconsView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingsView {
    pub average: f64,
    pub count: i32,
    pub rating_1: i32,
    pub rating_2: i32,
    pub rating_3: i32,
    pub rating_4: i32,
    pub rating_5: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconsView {
    pub large: Option<String>,
    pub small: Option<String>,
}

/// The caller's own rating of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRatingView {
    pub book_id: i32,
    pub rating: StarRating,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            isbn13: format!("{:013}", book.isbn13),
            authors: book.authors.clone(),
            publication: book.publication_year,
            original_title: book.original_title.clone(),
            title: book.title.clone(),
            ratings: RatingsView {
                average: book.rating_avg,
                count: book.rating_count,
                rating_1: book.rating_1_star,
                rating_2: book.rating_2_star,
                rating_3: book.rating_3_star,
                rating_4: book.rating_4_star,
                rating_5: book.rating_5_star,
            },
            icons: IconsView {
                large: book.image_url.clone(),
                small: book.image_small_url.clone(),
            },
        }
    }
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        BookView::from(&book)
    }
}
