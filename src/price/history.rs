use crate::models::PriceSample;
use std::collections::VecDeque;

/// Lowest bar height, in percent, so the minimum sample stays visible.
pub const BAR_FLOOR_PCT: f64 = 5.0;

/// Fixed-capacity price window, oldest first. Pushing past capacity evicts
/// from the front.
#[derive(Debug, Clone)]
pub struct PriceHistory {
    capacity: usize,
    samples: VecDeque<PriceSample>,
}

impl PriceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: PriceSample) {
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceSample> {
        self.samples.iter()
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        self.samples.iter().map(|s| s.price).fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
        })
    }

    /// Min-max scaled bar heights in percent, floored at [`BAR_FLOOR_PCT`].
    /// A flat window renders every bar full height.
    pub fn bar_heights(&self) -> Vec<f64> {
        let Some((lo, hi)) = self.range() else {
            return Vec::new();
        };
        let span = hi - lo;

        self.samples
            .iter()
            .map(|s| {
                if span <= 0.0 {
                    100.0
                } else {
                    ((s.price - lo) / span * 100.0).max(BAR_FLOOR_PCT)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sample(i: i64, price: f64) -> PriceSample {
        PriceSample {
            price,
            observed_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::hours(i),
        }
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut h = PriceHistory::new(24);
        for i in 0..100 {
            h.push(sample(i, 1000.0 + i as f64));
            assert!(h.len() <= 24);
        }
        assert_eq!(h.len(), 24);

        let prices: Vec<f64> = h.iter().map(|s| s.price).collect();
        let expected: Vec<f64> = (76..100).map(|i| 1000.0 + i as f64).collect();
        assert_eq!(prices, expected);
        assert!(h.iter().zip(h.iter().skip(1)).all(|(a, b)| a.observed_at < b.observed_at));
    }

    #[test]
    fn test_latest_is_newest() {
        let mut h = PriceHistory::new(2);
        assert!(h.latest().is_none());
        h.push(sample(0, 1.0));
        h.push(sample(1, 2.0));
        h.push(sample(2, 3.0));
        assert_eq!(h.latest().map(|s| s.price), Some(3.0));
        assert_eq!(h.range(), Some((2.0, 3.0)));
    }

    #[test]
    fn test_bar_heights_min_max_with_floor() {
        let mut h = PriceHistory::new(24);
        for (i, p) in [100.0, 150.0, 200.0].into_iter().enumerate() {
            h.push(sample(i as i64, p));
        }
        assert_eq!(h.bar_heights(), vec![BAR_FLOOR_PCT, 50.0, 100.0]);
    }

    #[test]
    fn test_flat_window_is_full_height() {
        let mut h = PriceHistory::new(24);
        h.push(sample(0, 42.0));
        h.push(sample(1, 42.0));
        assert_eq!(h.bar_heights(), vec![100.0, 100.0]);
        assert!(PriceHistory::new(3).bar_heights().is_empty());
    }
}
