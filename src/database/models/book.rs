use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ratings::types::{Aggregate, Histogram};

/// Column list shared by every query that maps a row onto [`Book`]
pub const BOOK_COLUMNS: &str = "id, isbn13, authors, publication_year, original_title, title, \
     rating_avg, rating_count, rating_1_star, rating_2_star, rating_3_star, rating_4_star, \
     rating_5_star, image_url, image_small_url";

/// A row of the books table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub isbn13: i64,
    pub authors: String,
    pub publication_year: i32,
    pub original_title: Option<String>,
    pub title: String,
    pub rating_avg: f64,
    pub rating_count: i32,
    pub rating_1_star: i32,
    pub rating_2_star: i32,
    pub rating_3_star: i32,
    pub rating_4_star: i32,
    pub rating_5_star: i32,
    pub image_url: Option<String>,
    pub image_small_url: Option<String>,
}

impl Book {
    /// An unrated book with no image links
    pub fn new(id: i32, isbn13: i64, authors: impl Into<String>, publication_year: i32, title: impl Into<String>) -> Self {
        Self {
            id,
            isbn13,
            authors: authors.into(),
            publication_year,
            original_title: None,
            title: title.into(),
            rating_avg: 0.0,
            rating_count: 0,
            rating_1_star: 0,
            rating_2_star: 0,
            rating_3_star: 0,
            rating_4_star: 0,
            rating_5_star: 0,
            image_url: None,
            image_small_url: None,
        }
    }

    pub fn aggregate(&self) -> Aggregate {
        Aggregate {
            count: self.rating_count,
            average: self.rating_avg,
            histogram: Histogram::new([
                self.rating_1_star,
                self.rating_2_star,
                self.rating_3_star,
                self.rating_4_star,
                self.rating_5_star,
            ]),
        }
    }

    pub fn set_aggregate(&mut self, aggregate: &Aggregate) {
        let [one, two, three, four, five] = aggregate.histogram.buckets();
        self.rating_count = aggregate.count;
        self.rating_avg = aggregate.average;
        self.rating_1_star = one;
        self.rating_2_star = two;
        self.rating_3_star = three;
        self.rating_4_star = four;
        self.rating_5_star = five;
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.set_aggregate(&aggregate);
        self
    }
}
