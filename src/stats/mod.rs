//! Sliding-window statistics over per-quantity telemetry streams.
//!
//! Each tracked physical quantity keeps its own window of the last N values.
//! Mean and population standard deviation are computed over the *current*
//! contents (divide by the current length, not N), which yields high variance
//! during warm-up; callers are expected to tolerate that. An empty window is
//! never an error: it reports mean 0 and deviation 0 to keep the stream
//! flowing.

use std::collections::VecDeque;

/// Fixed-capacity FIFO window of the most recent values of one quantity.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a value, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Mean of the current contents; 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.sum() / self.values.len() as f64
    }

    /// Population standard deviation of the current contents; 0 when empty.
    pub fn population_stddev(&self) -> f64 {
        self.deviation_about(self.mean())
    }

    /// Population standard deviation measured about an externally supplied
    /// mean. Needed by the coefficient-of-variation safe variant, which
    /// measures one window's spread about another window's mean.
    pub fn deviation_about(&self, mean: f64) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let var: f64 = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / self.values.len() as f64;
        var.sqrt()
    }
}

/// Relative delta between a value and its predecessor.
///
/// Returns 0 when the values are equal or when `current` is exactly 0 (no
/// division-by-zero fault), else `|current - previous| / |current|`.
pub fn relative_delta(current: f64, previous: f64) -> f64 {
    if current == previous {
        return 0.0;
    }
    if current == 0.0 {
        return 0.0;
    }
    ((current - previous) / current).abs()
}
