use std::collections::VecDeque;

use super::Metrics;

const PREALLOCATED: usize = 1024;

/// Rolling window of frame times.
///
/// Keeps the last `capacity` samples; older samples fall off the front.
#[derive(Debug, Clone)]
pub struct FrameStats {
    samples: VecDeque<f64>, // delta_ms
    capacity: usize,
}

/// Snapshot of a `FrameStats` window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StatsSummary {
    pub samples: usize,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub fps: f64,
}

impl FrameStats {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(PREALLOCATED)),
            capacity,
        }
    }

    pub fn record(&mut self, delta_ms: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(delta_ms);
    }

    pub fn record_metrics(&mut self, m: &Metrics) {
        self.record(m.delta_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn avg_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn fps(&self) -> f64 {
        let avg = self.avg_ms();
        if avg > 0.0 { 1000.0 / avg } else { 0.0 }
    }

    /// Nearest-rank percentile, `p` in `[0, 1]`: the smallest sample with at
    /// least `p` of the window at or below it.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let rank = (sorted.len() as f64 * p.clamp(0.0, 1.0)).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }

    pub fn summary(&self) -> Option<StatsSummary> {
        if self.samples.is_empty() {
            return None;
        }
        let min_ms = self.samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ms = self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(StatsSummary {
            samples: self.samples.len(),
            avg_ms: self.avg_ms(),
            min_ms,
            max_ms,
            p95_ms: self.percentile(0.95),
            fps: self.fps(),
        })
    }
}
