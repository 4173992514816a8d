//! Shared rating types used by the store, the aggregate updater and the API layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names of the per-star histogram cells on the books table, indexed by star - 1
const STAR_COLUMNS: [&str; 5] = [
    "rating_1_star",
    "rating_2_star",
    "rating_3_star",
    "rating_4_star",
    "rating_5_star",
];

/// A single rating value, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct StarRating(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating {0} is outside the range [1, 5]")]
pub struct InvalidStarRating(pub i64);

impl StarRating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, InvalidStarRating> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(InvalidStarRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Histogram column holding the count for this star value
    pub fn column(self) -> &'static str {
        STAR_COLUMNS[self.index()]
    }

    fn index(self) -> usize {
        (self.0 - Self::MIN) as usize
    }
}

impl TryFrom<i64> for StarRating {
    type Error = InvalidStarRating;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StarRating> for i64 {
    fn from(star: StarRating) -> Self {
        star.0 as i64
    }
}

impl From<StarRating> for i16 {
    fn from(star: StarRating) -> Self {
        star.0 as i16
    }
}

impl fmt::Display for StarRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-star rating counters of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram([i32; 5]);

impl Histogram {
    pub fn new(buckets: [i32; 5]) -> Self {
        Self(buckets)
    }

    pub fn get(&self, star: StarRating) -> i32 {
        self.0[star.index()]
    }

    pub fn buckets(&self) -> [i32; 5] {
        self.0
    }

    /// Sum of all buckets; equals the rating count on a consistent book
    pub fn total(&self) -> i64 {
        self.0.iter().map(|&n| n as i64).sum()
    }

    /// Returns false (leaving the bucket untouched) when the bucket is full
    pub(crate) fn increment(&mut self, star: StarRating) -> bool {
        let bucket = &mut self.0[star.index()];
        match bucket.checked_add(1) {
            Some(next) => {
                *bucket = next;
                true
            }
            None => false,
        }
    }

    /// Lowest and highest star values holding at least one rating
    pub fn star_range(&self) -> Option<(StarRating, StarRating)> {
        let mut filled = (0..self.0.len()).filter(|&i| self.0[i] > 0);
        let low = filled.next()?;
        let high = filled.last().unwrap_or(low);
        Some((Self::star_at(low), Self::star_at(high)))
    }

    fn star_at(index: usize) -> StarRating {
        StarRating(StarRating::MIN + index as u8)
    }

    /// Returns false (leaving the bucket untouched) when the bucket is already empty
    pub(crate) fn decrement(&mut self, star: StarRating) -> bool {
        let bucket = &mut self.0[star.index()];
        if *bucket <= 0 {
            return false;
        }
        *bucket -= 1;
        true
    }
}

/// The denormalized rating block stored on a book row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub count: i32,
    pub average: f64,
    pub histogram: Histogram,
}

impl Aggregate {
    pub fn empty() -> Self {
        Self {
            count: 0,
            average: 0.0,
            histogram: Histogram::default(),
        }
    }

    /// Count matches the histogram and an unrated book has a zero average
    pub fn is_consistent(&self) -> bool {
        self.count as i64 == self.histogram.total() && (self.count != 0 || self.average == 0.0)
    }
}

/// Histogram cells touched by a single rating mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StarDelta {
    pub removed: Option<StarRating>,
    pub added: Option<StarRating>,
}

impl StarDelta {
    pub fn add(star: StarRating) -> Self {
        Self { removed: None, added: Some(star) }
    }

    pub fn remove(star: StarRating) -> Self {
        Self { removed: Some(star), added: None }
    }

    /// Moving a rating onto the same bucket touches nothing
    pub fn change(old: StarRating, new: StarRating) -> Self {
        if old == new {
            return Self::default();
        }
        Self { removed: Some(old), added: Some(new) }
    }
}

/// Result of applying a rating mutation to an aggregate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateUpdate {
    pub aggregate: Aggregate,
    pub delta: StarDelta,
}
