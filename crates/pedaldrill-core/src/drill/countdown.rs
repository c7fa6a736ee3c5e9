//! Pre-roll countdown: `3 -> 2 -> 1 -> GO` with a fixed step length.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum CountdownValue {
    Count(u8),
    Go,
}

impl fmt::Display for CountdownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountdownValue::Count(n) => write!(f, "{n}"),
            CountdownValue::Go => f.write_str("GO"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_from")]
    pub from: u8,
    #[serde(default = "default_step_secs")]
    pub step_secs: f64,
}

fn default_from() -> u8 {
    3
}
fn default_step_secs() -> f64 {
    1.0
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            step_secs: default_step_secs(),
        }
    }
}

impl CountdownConfig {
    /// Total pre-roll length in seconds.
    pub fn total_secs(&self) -> f64 {
        f64::from(self.from) * self.step_secs.max(0.0)
    }
}

/// Bounded countdown. Value `k` (0-based) is due at `k * step_secs`;
/// `GO` is the last value and completes the countdown.
#[derive(Debug, Clone)]
pub struct Countdown {
    config: CountdownConfig,
    elapsed_secs: f64,
    emitted: u16,
}

impl Countdown {
    pub fn new(config: CountdownConfig) -> Self {
        Self {
            config,
            elapsed_secs: 0.0,
            emitted: 0,
        }
    }

    /// Values due at time zero.
    pub fn begin(&mut self) -> Vec<CountdownValue> {
        self.collect_due()
    }

    /// Advance by `dt` seconds and return any values that became due.
    pub fn advance(&mut self, dt: f64) -> Vec<CountdownValue> {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed_secs += dt;
        }
        self.collect_due()
    }

    pub fn is_complete(&self) -> bool {
        self.emitted > u16::from(self.config.from)
    }

    /// Most recently announced value.
    pub fn current(&self) -> Option<CountdownValue> {
        self.emitted.checked_sub(1).map(|k| self.value_at(k))
    }

    pub fn remaining_secs(&self) -> f64 {
        (self.config.total_secs() - self.elapsed_secs).max(0.0)
    }

    fn value_at(&self, k: u16) -> CountdownValue {
        match u8::try_from(k) {
            Ok(k) if k < self.config.from => CountdownValue::Count(self.config.from - k),
            _ => CountdownValue::Go,
        }
    }

    fn collect_due(&mut self) -> Vec<CountdownValue> {
        let mut due = Vec::new();
        let step = self.config.step_secs.max(0.0);
        while !self.is_complete() && f64::from(self.emitted) * step <= self.elapsed_secs + 1e-9 {
            due.push(self.value_at(self.emitted));
            self.emitted += 1;
        }
        due
    }
}
