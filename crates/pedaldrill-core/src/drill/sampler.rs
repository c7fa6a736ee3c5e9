//! Input sampler.
//!
//! Hosts push raw per-lane values between ticks with [`InputSampler::set`];
//! the session snapshots every lane once per tick. History is a rolling
//! window bounded by `retention_secs`.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::exercise::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    /// Session seconds.
    pub timestamp: f64,
    pub lane: Lane,
    /// 0.0..=1.0
    pub value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    current: HashMap<Lane, f64>,
    history: HashMap<Lane, VecDeque<InputSample>>,
    retention_secs: f64,
}

impl InputSampler {
    pub fn new(retention_secs: f64) -> Self {
        Self {
            current: HashMap::new(),
            history: HashMap::new(),
            retention_secs: retention_secs.max(0.0),
        }
    }

    pub fn retention_secs(&self) -> f64 {
        self.retention_secs
    }

    pub fn set_retention(&mut self, retention_secs: f64) {
        self.retention_secs = retention_secs.max(0.0);
    }

    /// Record the latest raw reading for a lane. Clamped into `[0, 1]`; NaN reads as 0.
    pub fn set(&mut self, lane: Lane, raw: f64) {
        self.current.insert(lane, normalize(raw));
    }

    /// Current value for a lane. Lanes never written read as 0.
    pub fn sample(&self, lane: Lane) -> f64 {
        self.current.get(&lane).copied().unwrap_or(0.0)
    }

    /// Append one sample per known lane at `now`, then drop expired history.
    pub fn snapshot(&mut self, now: f64) {
        for (lane, value) in &self.current {
            self.history.entry(*lane).or_default().push_back(InputSample {
                timestamp: now,
                lane: *lane,
                value: *value,
            });
        }
        self.prune(now);
    }

    /// Samples on `lane` with `from <= timestamp <= to`, oldest first.
    pub fn history(&self, lane: Lane, from: f64, to: f64) -> Vec<InputSample> {
        self.history
            .get(&lane)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.timestamp >= from && s.timestamp <= to)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn history_len(&self, lane: Lane) -> usize {
        self.history.get(&lane).map_or(0, VecDeque::len)
    }

    /// Lanes that have received at least one reading, with their current value.
    pub fn current_values(&self) -> Vec<(Lane, f64)> {
        let mut values: Vec<(Lane, f64)> = self.current.iter().map(|(l, v)| (*l, *v)).collect();
        values.sort_by_key(|(lane, _)| *lane);
        values
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.history.clear();
    }

    fn prune(&mut self, now: f64) {
        let cutoff = now - self.retention_secs;
        for samples in self.history.values_mut() {
            // Keep the newest sample so edge detection always has a predecessor.
            while samples.len() > 1 && samples.front().is_some_and(|s| s.timestamp < cutoff) {
                samples.pop_front();
            }
        }
    }
}

fn normalize(raw: f64) -> f64 {
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}
