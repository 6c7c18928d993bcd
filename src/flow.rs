use std::collections::VecDeque;

/// Intervals kept for the rolling flow score
pub const DEFAULT_FLOW_WINDOW: usize = 20;

/// Below this many intervals the score is considered noise and not computed
pub const MIN_FLOW_INTERVALS: usize = 6;

/// Interval spread (ms) that counts as one unit of inconsistency
const STD_DEV_UNIT_MS: f64 = 50.0;
const MIN_CONSISTENCY_FACTOR: f64 = 1.0;
const MAX_CONSISTENCY_FACTOR: f64 = 10.0;

/// Bounded history of input-change timestamps (milliseconds).
///
/// Holds `window + 1` timestamps so that exactly `window` intervals can be
/// derived; the oldest timestamp is dropped first.
#[derive(Debug, Clone, PartialEq)]
pub struct KeystrokeHistory {
    timestamps: VecDeque<u64>,
    window: usize,
}

impl KeystrokeHistory {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            timestamps: VecDeque::with_capacity(window + 1),
            window,
        }
    }

    pub fn record(&mut self, at_ms: u64) {
        self.timestamps.push_back(at_ms);
        while self.timestamps.len() > self.window + 1 {
            self.timestamps.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Gaps between consecutive timestamps, oldest first.
    pub fn intervals(&self) -> Vec<f64> {
        self.timestamps
            .iter()
            .zip(self.timestamps.iter().skip(1))
            .map(|(prev, next)| next.saturating_sub(*prev) as f64)
            .collect()
    }
}

impl Default for KeystrokeHistory {
    fn default() -> Self {
        Self::new(DEFAULT_FLOW_WINDOW)
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let avg = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = value - avg;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Flow ("wind power") score in `0..=100`, or `None` with too few samples.
///
/// Speed weighted by accuracy, divided by how irregular the keystroke rhythm
/// is. A spread below 50ms is not penalised; the penalty caps at 10x.
pub fn flow_score(intervals: &[f64], wpm: u32, accuracy: u32) -> Option<u32> {
    if intervals.len() < MIN_FLOW_INTERVALS {
        return None;
    }
    let spread = std_dev(intervals)?;
    let consistency =
        (spread / STD_DEV_UNIT_MS).clamp(MIN_CONSISTENCY_FACTOR, MAX_CONSISTENCY_FACTOR);
    let raw = (wpm as f64 * (accuracy as f64 / 100.0)) / consistency;

    Some(raw.round().clamp(0.0, 100.0) as u32)
}
