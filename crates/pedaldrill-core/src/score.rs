//! Score aggregation.
//!
//! Tier weights, running total, per-tier counts and combo. The aggregator
//! only sees judgments; it never touches session state.

use serde::{Deserialize, Serialize};

use crate::drill::Judgment;

/// Points per tier. MISS subtracts `miss_penalty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_perfect")]
    pub perfect: u32,
    #[serde(default = "default_great")]
    pub great: u32,
    #[serde(default = "default_good")]
    pub good: u32,
    #[serde(default = "default_ok")]
    pub ok: u32,
    #[serde(default)]
    pub miss_penalty: u32,
}

fn default_perfect() -> u32 {
    300
}
fn default_great() -> u32 {
    200
}
fn default_good() -> u32 {
    100
}
fn default_ok() -> u32 {
    50
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            perfect: default_perfect(),
            great: default_great(),
            good: default_good(),
            ok: default_ok(),
            miss_penalty: 0,
        }
    }
}

impl ScoreWeights {
    /// Signed contribution of one judgment.
    pub fn points(&self, judgment: Judgment) -> i64 {
        match judgment {
            Judgment::Perfect => i64::from(self.perfect),
            Judgment::Great => i64::from(self.great),
            Judgment::Good => i64::from(self.good),
            Judgment::Ok => i64::from(self.ok),
            Judgment::Miss => -i64::from(self.miss_penalty),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub ok: u32,
    pub miss: u32,
}

impl TierCounts {
    pub fn get(&self, judgment: Judgment) -> u32 {
        match judgment {
            Judgment::Perfect => self.perfect,
            Judgment::Great => self.great,
            Judgment::Good => self.good,
            Judgment::Ok => self.ok,
            Judgment::Miss => self.miss,
        }
    }

    fn bump(&mut self, judgment: Judgment) {
        let slot = match judgment {
            Judgment::Perfect => &mut self.perfect,
            Judgment::Great => &mut self.great,
            Judgment::Good => &mut self.good,
            Judgment::Ok => &mut self.ok,
            Judgment::Miss => &mut self.miss,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u32 {
        Judgment::ALL.iter().map(|j| self.get(*j)).sum()
    }
}

/// Read-only view of the running score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total: u64,
    pub counts: TierCounts,
    pub combo: u32,
    pub max_combo: u32,
    pub judged: u32,
    /// 0.0..=100.0, averaged over judged targets.
    pub accuracy_pct: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    weights: ScoreWeights,
    total: u64,
    counts: TierCounts,
    combo: u32,
    max_combo: u32,
    accuracy_sum: f64,
}

impl ScoreAggregator {
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights,
            ..Self::default()
        }
    }

    pub fn record(&mut self, judgment: Judgment) {
        let points = self.weights.points(judgment);
        self.total = if points >= 0 {
            self.total.saturating_add(points.unsigned_abs())
        } else {
            // Penalties floor at zero.
            self.total.saturating_sub(points.unsigned_abs())
        };
        self.counts.bump(judgment);
        self.accuracy_sum += judgment.accuracy_pct();
        if judgment.is_miss() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn summary(&self) -> ScoreSummary {
        let judged = self.counts.total();
        ScoreSummary {
            total: self.total,
            counts: self.counts,
            combo: self.combo,
            max_combo: self.max_combo,
            judged,
            accuracy_pct: if judged == 0 {
                0.0
            } else {
                self.accuracy_sum / f64::from(judged)
            },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.weights.clone());
    }
}
