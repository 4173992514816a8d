use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ratings::types::{InvalidStarRating, StarRating};

/// A row of the ratings table; unique per (account_id, book_id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub account_id: i32,
    pub book_id: i32,
    pub rating: i16,
}

impl Rating {
    pub fn star(&self) -> Result<StarRating, InvalidStarRating> {
        StarRating::new(self.rating as i64)
    }
}
