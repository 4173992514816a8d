//! Rolling recomputation of a book's rating aggregate.
//!
//! The new average is derived from the previous average and count instead of
//! re-reading every rating row, which keeps each mutation O(1). Repeated
//! updates accumulate floating-point drift in `rating_avg`; the histogram and
//! count stay exact, and the average is kept between the lowest and highest
//! star present.

use thiserror::Error;

use super::types::{Aggregate, AggregateUpdate, Histogram, StarDelta, StarRating};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("histogram bucket for {0} stars is already empty")]
    EmptyBucket(StarRating),

    #[error("aggregate has no ratings to change or remove")]
    NoRatings,

    #[error("rating count would overflow")]
    Overflow,
}

/// Keep a rolled average within the star values actually present in the
/// histogram; an unrated book averages exactly zero.
fn bounded_average(average: f64, histogram: &Histogram) -> f64 {
    match histogram.star_range() {
        Some((low, high)) => average.clamp(f64::from(low.value()), f64::from(high.value())),
        None => 0.0,
    }
}

pub fn apply_add(current: &Aggregate, new_value: StarRating) -> Result<AggregateUpdate, AggregateError> {
    let count = current.count.checked_add(1).ok_or(AggregateError::Overflow)?;
    let total = current.average * current.count as f64 + new_value.value() as f64;

    let mut histogram = current.histogram;
    if !histogram.increment(new_value) {
        return Err(AggregateError::Overflow);
    }

    Ok(AggregateUpdate {
        aggregate: Aggregate {
            count,
            average: bounded_average(total / count as f64, &histogram),
            histogram,
        },
        delta: StarDelta::add(new_value),
    })
}

pub fn apply_change(
    current: &Aggregate,
    old_value: StarRating,
    new_value: StarRating,
) -> Result<AggregateUpdate, AggregateError> {
    if current.count <= 0 {
        return Err(AggregateError::NoRatings);
    }

    let mut histogram = current.histogram;
    if old_value != new_value {
        if !histogram.decrement(old_value) {
            return Err(AggregateError::EmptyBucket(old_value));
        }
        if !histogram.increment(new_value) {
            return Err(AggregateError::Overflow);
        }
    }

    let total = current.average * current.count as f64 - old_value.value() as f64
        + new_value.value() as f64;

    Ok(AggregateUpdate {
        aggregate: Aggregate {
            count: current.count,
            average: bounded_average(total / current.count as f64, &histogram),
            histogram,
        },
        delta: StarDelta::change(old_value, new_value),
    })
}

pub fn apply_remove(current: &Aggregate, old_value: StarRating) -> Result<AggregateUpdate, AggregateError> {
    if current.count <= 0 {
        return Err(AggregateError::NoRatings);
    }

    let mut histogram = current.histogram;
    if !histogram.decrement(old_value) {
        return Err(AggregateError::EmptyBucket(old_value));
    }

    let count = current.count - 1;
    let average = if count == 0 {
        0.0
    } else {
        let rolled = (current.average * current.count as f64 - old_value.value() as f64) / count as f64;
        bounded_average(rolled, &histogram)
    };

    Ok(AggregateUpdate {
        aggregate: Aggregate { count, average, histogram },
        delta: StarDelta::remove(old_value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratings::types::Histogram;

    fn star(n: i64) -> StarRating {
        StarRating::new(n).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn add_to_unrated_book() {
        let update = apply_add(&Aggregate::empty(), star(4)).unwrap();
        assert_eq!(update.aggregate.count, 1);
        assert_close(update.aggregate.average, 4.0);
        assert_eq!(update.aggregate.histogram.buckets(), [0, 0, 0, 1, 0]);
        assert_eq!(update.delta, StarDelta::add(star(4)));
    }

    #[test]
    fn change_moves_one_bucket() {
        let current = Aggregate {
            count: 2,
            average: 3.0,
            histogram: Histogram::new([0, 1, 0, 1, 0]),
        };
        let update = apply_change(&current, star(2), star(5)).unwrap();
        assert_eq!(update.aggregate.count, 2);
        assert_close(update.aggregate.average, 4.5);
        assert_eq!(update.aggregate.histogram.buckets(), [0, 0, 0, 1, 1]);
        assert_eq!(update.delta.removed, Some(star(2)));
        assert_eq!(update.delta.added, Some(star(5)));
    }

    #[test]
    fn change_requires_existing_rating() {
        assert_eq!(
            apply_change(&Aggregate::empty(), star(1), star(2)),
            Err(AggregateError::NoRatings)
        );
    }

    #[test]
    fn change_from_empty_bucket_is_rejected() {
        let current = Aggregate {
            count: 1,
            average: 5.0,
            histogram: Histogram::new([0, 0, 0, 0, 1]),
        };
        assert_eq!(
            apply_change(&current, star(3), star(4)),
            Err(AggregateError::EmptyBucket(star(3)))
        );
    }

    #[test]
    fn removing_last_rating_zeroes_everything() {
        let current = Aggregate {
            count: 1,
            average: 2.0,
            histogram: Histogram::new([0, 1, 0, 0, 0]),
        };
        let update = apply_remove(&current, star(2)).unwrap();
        assert_eq!(update.aggregate.count, 0);
        assert_eq!(update.aggregate.average, 0.0);
        assert_eq!(update.aggregate.histogram, Histogram::default());
        assert!(update.aggregate.is_consistent());
    }

    #[test]
    fn remove_from_unrated_book_is_rejected() {
        assert_eq!(
            apply_remove(&Aggregate::empty(), star(3)),
            Err(AggregateError::NoRatings)
        );
    }

    #[test]
    fn add_change_remove_round_trip() {
        let start = Aggregate {
            count: 9,
            average: 4.0,
            histogram: Histogram::new([0, 0, 1, 3, 5]),
        };

        let added = apply_add(&start, star(5)).unwrap().aggregate;
        assert_eq!(added.count, 10);
        assert_close(added.average, 4.1);
        assert_eq!(added.histogram.get(star(5)), 6);

        let changed = apply_change(&added, star(5), star(3)).unwrap().aggregate;
        assert_eq!(changed.count, 10);
        assert_close(changed.average, 3.9);
        assert_eq!(changed.histogram.get(star(5)), 5);
        assert_eq!(changed.histogram.get(star(3)), 2);

        let removed = apply_remove(&changed, star(3)).unwrap().aggregate;
        assert_eq!(removed.count, 9);
        assert_close(removed.average, 4.0);
        assert_eq!(removed.histogram, start.histogram);
    }

    #[test]
    fn drifted_average_is_pulled_back_into_range() {
        // A single 5-star rating whose stored average drifted just above 5
        let drifted = Aggregate {
            count: 1,
            average: 5.000_000_000_000_003_6,
            histogram: Histogram::new([0, 0, 0, 0, 1]),
        };

        let added = apply_add(&drifted, star(5)).unwrap().aggregate;
        assert_eq!(added.average, 5.0);

        let changed = apply_change(&drifted, star(5), star(1)).unwrap().aggregate;
        assert_eq!(changed.average, 1.0);

        let low = Aggregate {
            count: 2,
            average: 0.999_999_999_999_9,
            histogram: Histogram::new([2, 0, 0, 0, 0]),
        };
        assert_eq!(apply_remove(&low, star(1)).unwrap().aggregate.average, 1.0);
    }

    #[test]
    fn long_mixed_sequence_stays_within_star_bounds() {
        // Seven accounts on one book, driven by a fixed linear congruential sequence
        let mut ratings: [Option<StarRating>; 7] = [None; 7];
        let mut aggregate = Aggregate::empty();
        let mut seed: u64 = 0x2545_f491;

        for _ in 0..5_000 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let account = (seed >> 33) as usize % ratings.len();
            let value = star(((seed >> 45) % 5) as i64 + 1);

            let update = match ratings[account] {
                None => {
                    ratings[account] = Some(value);
                    apply_add(&aggregate, value).unwrap()
                }
                Some(old) if (seed >> 20) % 3 == 0 => {
                    ratings[account] = None;
                    apply_remove(&aggregate, old).unwrap()
                }
                Some(old) => {
                    ratings[account] = Some(value);
                    apply_change(&aggregate, old, value).unwrap()
                }
            };
            aggregate = update.aggregate;

            assert!(aggregate.is_consistent(), "inconsistent {:?}", aggregate);
            match aggregate.histogram.star_range() {
                Some((low, high)) => {
                    assert!(aggregate.average >= f64::from(low.value()), "{:?}", aggregate);
                    assert!(aggregate.average <= f64::from(high.value()), "{:?}", aggregate);
                }
                None => assert_eq!(aggregate.average, 0.0),
            }
        }
    }

    #[test]
    fn add_refuses_to_overflow_count() {
        let full = Aggregate {
            count: i32::MAX,
            average: 3.0,
            histogram: Histogram::new([0, 0, i32::MAX, 0, 0]),
        };
        assert_eq!(apply_add(&full, star(3)), Err(AggregateError::Overflow));
    }
}
