//! Sliding time window over (timestamp, value) samples.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::domain::foundation::Timestamp;

/// Bounded trailing-interval aggregate over timestamped samples.
///
/// Keeps a time-ordered queue with a running sum so the current average is
/// always O(1) to read. On each push, samples that fell out of the trailing
/// interval (measured from the newest sample) are evicted and subtracted
/// from the sum. Each sample is pushed and popped exactly once, so the
/// amortized cost per event is O(1).
///
/// Out-of-order arrivals are inserted at their timestamp position; the
/// resulting aggregate is therefore independent of arrival order for
/// samples with distinct timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidingWindow {
    window_secs: i64,
    samples: VecDeque<(Timestamp, f64)>,
    sum: f64,
}

impl SlidingWindow {
    /// Creates an empty window spanning the given number of trailing days.
    pub fn over_days(days: i64) -> Self {
        Self {
            window_secs: days * 24 * 60 * 60,
            samples: VecDeque::new(),
            sum: 0.0,
        }
    }

    /// Adds a sample and evicts everything older than the trailing interval.
    pub fn push(&mut self, at: Timestamp, value: f64) {
        // Usually in arrival order, so scan for the insert point from the back.
        let mut idx = self.samples.len();
        while idx > 0 && self.samples[idx - 1].0.is_after(&at) {
            idx -= 1;
        }
        self.samples.insert(idx, (at, value));
        self.sum += value;
        self.evict_expired();
    }

    /// Drops samples strictly older than `latest - window`.
    ///
    /// A sample exactly on the boundary stays in the window.
    fn evict_expired(&mut self) {
        let Some(&(latest, _)) = self.samples.back() else {
            return;
        };
        let cutoff = latest.minus_secs(self.window_secs);
        while let Some(&(ts, value)) = self.samples.front() {
            if ts.is_before(&cutoff) {
                self.sum -= value;
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Current average of in-window samples, or None when empty.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum / self.samples.len() as f64)
        }
    }

    /// Number of in-window samples.
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// True when the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the newest sample, if any.
    pub fn latest(&self) -> Option<Timestamp> {
        self.samples.back().map(|&(ts, _)| ts)
    }

    /// Trend across the window: mean of the newest `k` samples minus mean
    /// of the oldest `k`.
    ///
    /// Returns 0.0 when fewer than `2k` samples exist; a trend is stated
    /// explicitly or not at all, never guessed from partial data.
    pub fn trend(&self, k: usize) -> f64 {
        if k == 0 || self.samples.len() < 2 * k {
            return 0.0;
        }
        let newest: f64 = self.samples.iter().rev().take(k).map(|&(_, v)| v).sum();
        let oldest: f64 = self.samples.iter().take(k).map(|&(_, v)| v).sum();
        (newest - oldest) / k as f64
    }

    /// In-window values in timestamp order (oldest first).
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|&(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts(day: i64) -> Timestamp {
        base().plus_days(day)
    }

    fn base() -> Timestamp {
        "2024-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn empty_window_has_no_average() {
        let window = SlidingWindow::over_days(7);
        assert_eq!(window.average(), None);
        assert!(window.is_empty());
    }

    #[test]
    fn average_covers_all_in_window_samples() {
        let mut window = SlidingWindow::over_days(7);
        window.push(ts(0), 4.0);
        window.push(ts(1), 6.0);
        window.push(ts(2), 8.0);

        assert_eq!(window.average(), Some(6.0));
        assert_eq!(window.count(), 3);
    }

    #[test]
    fn old_samples_are_evicted_on_push() {
        let mut window = SlidingWindow::over_days(7);
        window.push(ts(0), 10.0);
        window.push(ts(10), 2.0);

        // Day 0 fell out of the 7-day interval trailing day 10.
        assert_eq!(window.count(), 1);
        assert_eq!(window.average(), Some(2.0));
    }

    #[test]
    fn boundary_sample_is_kept() {
        let mut window = SlidingWindow::over_days(7);
        window.push(ts(0), 4.0);
        window.push(ts(7), 8.0);

        // Exactly seven days apart: both inside the trailing interval.
        assert_eq!(window.count(), 2);
        assert_eq!(window.average(), Some(6.0));
    }

    #[test]
    fn out_of_order_push_lands_at_timestamp_position() {
        let mut ordered = SlidingWindow::over_days(30);
        ordered.push(ts(0), 1.0);
        ordered.push(ts(1), 2.0);
        ordered.push(ts(2), 3.0);

        let mut shuffled = SlidingWindow::over_days(30);
        shuffled.push(ts(2), 3.0);
        shuffled.push(ts(0), 1.0);
        shuffled.push(ts(1), 2.0);

        assert_eq!(ordered, shuffled);
    }

    #[test]
    fn trend_is_zero_below_two_k_samples() {
        let mut window = SlidingWindow::over_days(30);
        window.push(ts(0), 1.0);
        window.push(ts(1), 2.0);
        window.push(ts(2), 3.0);

        // 3 samples < 2 * 2.
        assert_eq!(window.trend(2), 0.0);
    }

    #[test]
    fn trend_compares_newest_and_oldest_means() {
        let mut window = SlidingWindow::over_days(30);
        for (day, value) in [(0, 8.0), (1, 7.0), (2, 3.0), (3, 2.0)] {
            window.push(ts(day), value);
        }

        // Newest two mean 2.5, oldest two mean 7.5.
        assert!((window.trend(2) - (-5.0)).abs() < 1e-9);
    }

    #[test]
    fn trend_with_zero_k_is_zero() {
        let mut window = SlidingWindow::over_days(30);
        window.push(ts(0), 1.0);
        assert_eq!(window.trend(0), 0.0);
    }

    proptest! {
        /// The window average equals the arithmetic mean of in-window samples,
        /// independent of arrival order for distinct timestamps.
        #[test]
        fn average_is_order_independent(perm in proptest::sample::subsequence(
            (0..10i64).collect::<Vec<_>>(), 3..10)
        ) {
            let values: Vec<(i64, f64)> =
                perm.iter().map(|&d| (d, d as f64 + 0.5)).collect();

            let mut forward = SlidingWindow::over_days(30);
            for &(d, v) in &values {
                forward.push(ts(d), v);
            }

            let mut reversed = SlidingWindow::over_days(30);
            for &(d, v) in values.iter().rev() {
                reversed.push(ts(d), v);
            }

            let expected: f64 =
                values.iter().map(|&(_, v)| v).sum::<f64>() / values.len() as f64;

            prop_assert!((forward.average().unwrap() - expected).abs() < 1e-9);
            prop_assert!((reversed.average().unwrap() - expected).abs() < 1e-9);
        }
    }
}
