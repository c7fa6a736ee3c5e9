//! Judgment engine.
//!
//! Each target owns a closed evaluation window
//! `[time - early, time + late]` where `early`/`late` are the widest bounds
//! of the tolerance table. The engine consumes sampler history once per tick
//! and resolves targets:
//!
//! - instantaneous targets on the first rising edge inside the window,
//!   tiered by the edge's offset from `time`;
//! - hold targets when the input has stayed above threshold for the full
//!   hold after a qualifying edge;
//! - anything still waiting once `now` passes the late bound to MISS.
//!
//! Resolutions are emitted at most once per target.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::sampler::{InputSample, InputSampler};
use crate::error::{ConfigError, CoreError, ExerciseError};
use crate::exercise::{validate_targets, Lane, Target, TargetId};

/// Slack for float comparisons on sample timestamps.
const TIME_EPSILON: f64 = 1e-9;

/// Quality tier assigned to a resolved target. Declared best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgment {
    Perfect,
    Great,
    Good,
    Ok,
    Miss,
}

impl Judgment {
    pub const ALL: [Judgment; 5] = [
        Judgment::Perfect,
        Judgment::Great,
        Judgment::Good,
        Judgment::Ok,
        Judgment::Miss,
    ];

    pub fn is_miss(&self) -> bool {
        *self == Judgment::Miss
    }

    /// The worse of two tiers.
    pub fn cap(self, floor: Judgment) -> Judgment {
        self.max(floor)
    }

    /// Percent credit used by the accuracy read-out.
    pub fn accuracy_pct(&self) -> f64 {
        match self {
            Judgment::Perfect => 100.0,
            Judgment::Great => 75.0,
            Judgment::Good => 50.0,
            Judgment::Ok => 25.0,
            Judgment::Miss => 0.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Judgment::Perfect => "Perfect",
            Judgment::Great => "Great",
            Judgment::Good => "Good",
            Judgment::Ok => "OK",
            Judgment::Miss => "Miss",
        }
    }
}

/// One row of the tolerance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierWindow {
    pub judgment: Judgment,
    /// Seconds before the target time still inside this tier.
    pub early_secs: f64,
    /// Seconds after the target time still inside this tier.
    pub late_secs: f64,
}

impl TierWindow {
    pub fn symmetric(judgment: Judgment, secs: f64) -> Self {
        Self {
            judgment,
            early_secs: secs,
            late_secs: secs,
        }
    }
}

/// Tier widths, best tier first. The last row defines the evaluation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceTable {
    pub tiers: Vec<TierWindow>,
}

impl Default for ToleranceTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierWindow::symmetric(Judgment::Perfect, 0.050),
                TierWindow::symmetric(Judgment::Great, 0.100),
                TierWindow::symmetric(Judgment::Good, 0.150),
                TierWindow::symmetric(Judgment::Ok, 0.200),
            ],
        }
    }
}

impl ToleranceTable {
    pub fn widest_early(&self) -> f64 {
        self.tiers.iter().map(|t| t.early_secs).fold(0.0, f64::max)
    }

    pub fn widest_late(&self) -> f64 {
        self.tiers.iter().map(|t| t.late_secs).fold(0.0, f64::max)
    }

    /// Tier for an input offset (`delta < 0` is early). Ties go to the better tier.
    pub fn classify(&self, delta_secs: f64) -> Option<Judgment> {
        self.tiers
            .iter()
            .find(|tier| {
                if delta_secs < 0.0 {
                    -delta_secs <= tier.early_secs + TIME_EPSILON
                } else {
                    delta_secs <= tier.late_secs + TIME_EPSILON
                }
            })
            .map(|tier| tier.judgment)
    }

    /// Check that tiers are non-empty, strictly best-to-worst, never MISS,
    /// and that widths never shrink from one tier to the next.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "judge.tolerance.tiers".into(),
            message,
        };
        if self.tiers.is_empty() {
            return Err(invalid("at least one tier is required".into()));
        }
        for tier in &self.tiers {
            if tier.judgment.is_miss() {
                return Err(invalid("MISS cannot have a window".into()));
            }
            if !(tier.early_secs.is_finite() && tier.late_secs.is_finite())
                || tier.early_secs < 0.0
                || tier.late_secs < 0.0
            {
                return Err(invalid(format!(
                    "{} bounds must be finite and >= 0",
                    tier.judgment.label()
                )));
            }
        }
        for pair in self.tiers.windows(2) {
            if pair[1].judgment <= pair[0].judgment {
                return Err(invalid("tiers must be listed best to worst".into()));
            }
            if pair[1].early_secs < pair[0].early_secs || pair[1].late_secs < pair[0].late_secs {
                return Err(invalid(format!(
                    "{} is narrower than {}",
                    pair[1].judgment.label(),
                    pair[0].judgment.label()
                )));
            }
        }
        Ok(())
    }
}

/// Judging rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Normalized input at or above this value counts as pressed.
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,
    #[serde(default)]
    pub tolerance: ToleranceTable,
    /// Best tier a broken hold can still earn.
    #[serde(default = "default_broken_hold_tier")]
    pub broken_hold_tier: Judgment,
    /// Fraction of the hold that must be sustained before a broken hold earns anything.
    #[serde(default = "default_partial_hold_ratio")]
    pub partial_hold_ratio: f64,
}

fn default_activation_threshold() -> f64 {
    0.5
}
fn default_broken_hold_tier() -> Judgment {
    Judgment::Ok
}
fn default_partial_hold_ratio() -> f64 {
    0.5
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            activation_threshold: default_activation_threshold(),
            tolerance: ToleranceTable::default(),
            broken_hold_tier: default_broken_hold_tier(),
            partial_hold_ratio: default_partial_hold_ratio(),
        }
    }
}

impl JudgeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tolerance.validate()?;
        if !(0.0..=1.0).contains(&self.activation_threshold) || self.activation_threshold == 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "judge.activation_threshold".into(),
                message: "must be within (0, 1]".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.partial_hold_ratio) {
            return Err(ConfigError::InvalidValue {
                key: "judge.partial_hold_ratio".into(),
                message: "must be within [0, 1]".into(),
            });
        }
        Ok(())
    }
}

/// A judgment produced during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target: Target,
    pub judgment: Judgment,
    /// Offset of the qualifying input from the target time; `None` when no input qualified.
    pub delta_secs: Option<f64>,
    /// Session time at which the judgment was assigned.
    pub at_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Progress {
    Waiting,
    Holding {
        pressed_at: f64,
        tier: Judgment,
        delta: f64,
    },
    Broken {
        earned: Option<Judgment>,
        delta: f64,
    },
    Resolved,
}

#[derive(Debug, Clone)]
struct Slot {
    target: Target,
    open: f64,
    late_bound: f64,
    progress: Progress,
}

#[derive(Debug, Clone, Copy, Default)]
struct LaneCursor {
    above: bool,
    last_seen: Option<f64>,
}

/// Per-session judging state. Built once the session goes active.
#[derive(Debug, Clone)]
pub struct JudgmentEngine {
    config: JudgeConfig,
    slots: Vec<Slot>,
    cursors: [LaneCursor; Lane::COUNT],
}

impl JudgmentEngine {
    pub fn new(config: JudgeConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            cursors: [LaneCursor::default(); Lane::COUNT],
        }
    }

    /// Align lane edge tracking with the sampler's current values, so an
    /// input already held when judging begins is not read as a crossing.
    pub fn prime(&mut self, sampler: &InputSampler) {
        for (idx, lane) in Lane::ALL.iter().enumerate() {
            self.cursors[idx].above = sampler.sample(*lane) >= self.config.activation_threshold;
        }
    }

    /// Build an engine over an already validated target list.
    pub fn with_targets(config: JudgeConfig, targets: &[Target]) -> Self {
        let mut engine = Self::new(config);
        for target in targets {
            engine.push_slot(target.clone());
        }
        engine.sort_slots();
        engine
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn target_count(&self) -> usize {
        self.slots.len()
    }

    pub fn unresolved_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.progress != Progress::Resolved)
            .count()
    }

    /// Unresolved targets whose time lies within `[from, to]`.
    pub fn upcoming(&self, from: f64, to: f64) -> Vec<&Target> {
        self.slots
            .iter()
            .filter(|s| s.progress != Progress::Resolved)
            .filter(|s| s.target.time >= from && s.target.time <= to)
            .map(|s| &s.target)
            .collect()
    }

    /// Seconds of sampler history the engine may still need.
    pub fn retention_secs(&self) -> f64 {
        let longest_hold = self
            .slots
            .iter()
            .map(|s| s.target.hold_secs())
            .fold(0.0, f64::max);
        let table = &self.config.tolerance;
        table.widest_early() + table.widest_late() + longest_hold
    }

    /// Add streamed targets to a running engine.
    ///
    /// # Errors
    ///
    /// `InvalidExercise` when the new batch is malformed on its own or
    /// reuses an id; `JudgmentWindowViolation` when a new window overlaps
    /// one already loaded on the same lane.
    pub fn append(&mut self, targets: Vec<Target>) -> Result<(), CoreError> {
        let table = &self.config.tolerance;
        validate_targets(&targets, None, table)?;

        let known: HashSet<TargetId> = self.slots.iter().map(|s| s.target.id).collect();
        let span = table.widest_early() + table.widest_late();
        for target in &targets {
            if known.contains(&target.id) {
                return Err(ExerciseError::DuplicateId(target.id).into());
            }
            let clash = self.slots.iter().find(|s| {
                s.target.lane == target.lane && {
                    let (a, b) = if s.target.time <= target.time {
                        (&s.target, target)
                    } else {
                        (target, &s.target)
                    };
                    b.time - a.time <= a.hold_secs() + span
                }
            });
            if let Some(existing) = clash {
                return Err(CoreError::JudgmentWindowViolation {
                    lane: target.lane,
                    first: existing.target.id,
                    second: target.id,
                });
            }
        }

        for target in targets {
            self.push_slot(target);
        }
        self.sort_slots();
        Ok(())
    }

    /// Consume new sampler history up to `now` and close expired windows.
    ///
    /// # Errors
    ///
    /// `JudgmentWindowViolation` if an input edge falls inside two open
    /// windows on the same lane.
    pub fn process(
        &mut self,
        now: f64,
        sampler: &InputSampler,
    ) -> Result<Vec<Resolution>, CoreError> {
        let mut out = Vec::new();
        for (idx, lane) in Lane::ALL.iter().enumerate() {
            let from = self.cursors[idx].last_seen.unwrap_or(f64::NEG_INFINITY);
            for sample in sampler.history(*lane, from, now) {
                if self.cursors[idx]
                    .last_seen
                    .is_some_and(|seen| sample.timestamp <= seen)
                {
                    continue;
                }
                self.cursors[idx].last_seen = Some(sample.timestamp);
                self.observe(idx, &sample, &mut out)?;
            }
        }
        self.close_windows(now, &mut out);
        Ok(out)
    }

    /// Resolve everything still open. Holds that already broke keep the tier
    /// they earned; everything else becomes MISS.
    pub fn force_resolve(&mut self, now: f64) -> Vec<Resolution> {
        let mut out = Vec::new();
        for slot in &mut self.slots {
            let (judgment, delta) = match slot.progress {
                Progress::Resolved => continue,
                Progress::Broken { earned, delta } => {
                    (earned.unwrap_or(Judgment::Miss), Some(delta))
                }
                Progress::Holding { delta, .. } => (Judgment::Miss, Some(delta)),
                Progress::Waiting => (Judgment::Miss, None),
            };
            slot.progress = Progress::Resolved;
            out.push(Resolution {
                target: slot.target.clone(),
                judgment,
                delta_secs: delta,
                at_secs: now,
            });
        }
        out
    }

    fn observe(
        &mut self,
        lane_idx: usize,
        sample: &InputSample,
        out: &mut Vec<Resolution>,
    ) -> Result<(), CoreError> {
        let above = sample.value >= self.config.activation_threshold;
        let was_above = self.cursors[lane_idx].above;
        self.cursors[lane_idx].above = above;

        let partial_ratio = self.config.partial_hold_ratio;
        let broken_cap = self.config.broken_hold_tier;

        if let Some(slot) = self.slots.iter_mut().find(|s| {
            s.target.lane == sample.lane && matches!(s.progress, Progress::Holding { .. })
        }) {
            if let Progress::Holding {
                pressed_at,
                tier,
                delta,
            } = slot.progress
            {
                let hold = slot.target.hold_secs();
                let held = sample.timestamp - pressed_at;
                // A drop sampled at or past the hold end still completes it.
                if held + TIME_EPSILON >= hold {
                    slot.progress = Progress::Resolved;
                    debug!(target_id = slot.target.id, judgment = ?tier, "hold completed");
                    out.push(Resolution {
                        target: slot.target.clone(),
                        judgment: tier,
                        delta_secs: Some(delta),
                        at_secs: sample.timestamp,
                    });
                } else if !above {
                    let earned = (held / hold >= partial_ratio).then(|| tier.cap(broken_cap));
                    debug!(
                        target_id = slot.target.id,
                        held_secs = held,
                        ?earned,
                        "hold broken"
                    );
                    slot.progress = Progress::Broken { earned, delta };
                }
            }
            return Ok(());
        }

        if !above || was_above {
            return Ok(());
        }

        let t = sample.timestamp;
        let mut open = self.slots.iter().enumerate().filter(|(_, s)| {
            s.target.lane == sample.lane
                && s.progress == Progress::Waiting
                && t + TIME_EPSILON >= s.open
                && t <= s.late_bound + TIME_EPSILON
        });
        let Some((idx, first)) = open.next() else {
            return Ok(());
        };
        if let Some((_, second)) = open.next() {
            return Err(CoreError::JudgmentWindowViolation {
                lane: sample.lane,
                first: first.target.id,
                second: second.target.id,
            });
        }

        let slot = &mut self.slots[idx];
        let delta = t - slot.target.time;
        let Some(tier) = self.config.tolerance.classify(delta) else {
            return Ok(());
        };
        if slot.target.is_hold() {
            slot.progress = Progress::Holding {
                pressed_at: t,
                tier,
                delta,
            };
        } else {
            slot.progress = Progress::Resolved;
            debug!(target_id = slot.target.id, judgment = ?tier, delta, "target hit");
            out.push(Resolution {
                target: slot.target.clone(),
                judgment: tier,
                delta_secs: Some(delta),
                at_secs: t,
            });
        }
        Ok(())
    }

    fn close_windows(&mut self, now: f64, out: &mut Vec<Resolution>) {
        for slot in &mut self.slots {
            if now <= slot.late_bound + TIME_EPSILON {
                continue;
            }
            let (judgment, delta) = match slot.progress {
                Progress::Waiting => (Judgment::Miss, None),
                Progress::Broken { earned, delta } => {
                    (earned.unwrap_or(Judgment::Miss), Some(delta))
                }
                Progress::Holding { .. } | Progress::Resolved => continue,
            };
            slot.progress = Progress::Resolved;
            debug!(target_id = slot.target.id, judgment = ?judgment, "window closed");
            out.push(Resolution {
                target: slot.target.clone(),
                judgment,
                delta_secs: delta,
                at_secs: now,
            });
        }
    }

    fn push_slot(&mut self, target: Target) {
        let table = &self.config.tolerance;
        let open = target.time - table.widest_early();
        let late_bound = target.time + table.widest_late();
        self.slots.push(Slot {
            target,
            open,
            late_bound,
            progress: Progress::Waiting,
        });
    }

    fn sort_slots(&mut self) {
        self.slots.sort_by(|a, b| {
            a.target
                .time
                .total_cmp(&b.target.time)
                .then(a.target.lane.cmp(&b.target.lane))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 0.01;

    /// Feed a constant value per step and run the engine at each step.
    fn drive(
        engine: &mut JudgmentEngine,
        sampler: &mut InputSampler,
        lane: Lane,
        from: f64,
        to: f64,
        value_at: impl Fn(f64) -> f64,
    ) -> Vec<Resolution> {
        let mut out = Vec::new();
        let steps = ((to - from) / DT).round() as usize;
        for i in 0..=steps {
            let now = from + i as f64 * DT;
            sampler.set(lane, value_at(now));
            sampler.snapshot(now);
            out.extend(engine.process(now, sampler).unwrap());
        }
        out
    }

    #[test]
    fn classify_prefers_better_tier_on_boundary() {
        let table = ToleranceTable::default();
        assert_eq!(table.classify(0.0), Some(Judgment::Perfect));
        assert_eq!(table.classify(0.05), Some(Judgment::Perfect));
        assert_eq!(table.classify(-0.08), Some(Judgment::Great));
        assert_eq!(table.classify(0.12), Some(Judgment::Good));
        assert_eq!(table.classify(-0.2), Some(Judgment::Ok));
        assert_eq!(table.classify(0.25), None);
    }

    #[test]
    fn default_table_is_valid() {
        assert!(ToleranceTable::default().validate().is_ok());
        assert!(JudgeConfig::default().validate().is_ok());
    }

    #[test]
    fn table_rejects_misordered_tiers() {
        let table = ToleranceTable {
            tiers: vec![
                TierWindow::symmetric(Judgment::Great, 0.1),
                TierWindow::symmetric(Judgment::Perfect, 0.05),
            ],
        };
        assert!(table.validate().is_err());

        let table = ToleranceTable {
            tiers: vec![
                TierWindow::symmetric(Judgment::Perfect, 0.1),
                TierWindow::symmetric(Judgment::Great, 0.05),
            ],
        };
        assert!(table.validate().is_err());
    }

    #[test]
    fn cap_takes_the_worse_tier() {
        assert_eq!(Judgment::Perfect.cap(Judgment::Ok), Judgment::Ok);
        assert_eq!(Judgment::Miss.cap(Judgment::Ok), Judgment::Miss);
    }

    #[test]
    fn instant_target_hit_on_time_is_perfect() {
        let targets = vec![Target::instant(1, 1.0, Lane::Brake, 80)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        let out = drive(&mut engine, &mut sampler, Lane::Brake, 0.0, 1.5, |t| {
            if t >= 1.0 - 1e-9 {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Perfect);
        assert!(out[0].delta_secs.unwrap().abs() < 1e-6);
    }

    #[test]
    fn late_press_lands_in_wider_tier() {
        let targets = vec![Target::instant(1, 1.0, Lane::Accelerator, 80)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        let out = drive(&mut engine, &mut sampler, Lane::Accelerator, 0.0, 1.5, |t| {
            if t >= 1.13 - 1e-9 {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Good);
    }

    #[test]
    fn no_input_resolves_to_miss_after_window() {
        let targets = vec![Target::instant(1, 1.0, Lane::Brake, 80)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let sampler = InputSampler::new(5.0);
        assert!(engine.process(1.2, &sampler).unwrap().is_empty());
        let out = engine.process(1.25, &sampler).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Miss);
        assert_eq!(out[0].delta_secs, None);
        assert!(engine.process(2.0, &sampler).unwrap().is_empty());
    }

    #[test]
    fn input_held_before_window_is_not_a_crossing() {
        let targets = vec![Target::instant(1, 1.0, Lane::Brake, 80)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        let out = drive(&mut engine, &mut sampler, Lane::Brake, 0.0, 1.5, |_| 1.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Miss);
    }

    #[test]
    fn primed_engine_ignores_input_held_from_the_start() {
        let targets = vec![Target::instant(1, 0.1, Lane::Brake, 80)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        sampler.set(Lane::Brake, 1.0);
        engine.prime(&sampler);
        let out = drive(&mut engine, &mut sampler, Lane::Brake, 0.0, 0.5, |_| 1.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Miss);
    }

    #[test]
    fn hold_released_exactly_at_its_end_completes() {
        let targets = vec![Target::hold(1, 1.0, Lane::Brake, 80, 0.4)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        let out = drive(&mut engine, &mut sampler, Lane::Brake, 0.0, 2.0, |t| {
            if (1.0 - 1e-9..1.4 - 1e-9).contains(&t) {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Perfect);
    }

    #[test]
    fn completed_hold_keeps_start_tier() {
        let targets = vec![Target::hold(1, 1.0, Lane::Brake, 80, 0.4)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        let out = drive(&mut engine, &mut sampler, Lane::Brake, 0.0, 2.0, |t| {
            if (1.0 - 1e-9..1.6).contains(&t) {
                0.8
            } else {
                0.0
            }
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Perfect);
        assert!(out[0].at_secs >= 1.4 - 1e-6);
    }

    #[test]
    fn broken_hold_is_capped() {
        let targets = vec![Target::hold(1, 1.0, Lane::Brake, 80, 1.0)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        // Held 0.7s of a 1.0s hold: passes the partial ratio, capped to OK.
        let out = drive(&mut engine, &mut sampler, Lane::Brake, 0.0, 2.5, |t| {
            if (1.0 - 1e-9..1.7 - 1e-9).contains(&t) {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Ok);
    }

    #[test]
    fn short_broken_hold_is_miss_and_not_retried() {
        let targets = vec![Target::hold(1, 1.0, Lane::Brake, 80, 1.0)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let mut sampler = InputSampler::new(5.0);
        // Tap briefly, release, press again while the window is still open.
        let out = drive(&mut engine, &mut sampler, Lane::Brake, 0.0, 3.0, |t| {
            if (1.0 - 1e-9..1.1 - 1e-9).contains(&t) || t >= 1.15 {
                1.0
            } else {
                0.0
            }
        });
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].judgment, Judgment::Miss);
    }

    #[test]
    fn force_resolve_marks_open_targets_miss() {
        let targets = vec![
            Target::instant(1, 1.0, Lane::Brake, 80),
            Target::instant(2, 1.0, Lane::Accelerator, 80),
        ];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let out = engine.force_resolve(0.5);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.judgment == Judgment::Miss));
        assert_eq!(engine.unresolved_count(), 0);
        assert!(engine.force_resolve(0.6).is_empty());
    }

    #[test]
    fn append_rejects_overlapping_window() {
        let targets = vec![Target::instant(1, 1.0, Lane::Brake, 80)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let err = engine
            .append(vec![Target::instant(2, 1.2, Lane::Brake, 80)])
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::JudgmentWindowViolation { first: 1, second: 2, .. }
        ));

        engine
            .append(vec![Target::instant(3, 2.0, Lane::Brake, 80)])
            .unwrap();
        assert_eq!(engine.target_count(), 2);
    }

    #[test]
    fn append_rejects_reused_id() {
        let targets = vec![Target::instant(1, 1.0, Lane::Brake, 80)];
        let mut engine = JudgmentEngine::with_targets(JudgeConfig::default(), &targets);
        let err = engine
            .append(vec![Target::instant(1, 5.0, Lane::Accelerator, 80)])
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidExercise(ExerciseError::DuplicateId(1))
        ));
    }

    #[test]
    fn crossing_inside_two_windows_is_a_violation() {
        // Bypass validation to load overlapping windows.
        let mut engine = JudgmentEngine::new(JudgeConfig::default());
        engine.push_slot(Target::instant(1, 1.0, Lane::Brake, 80));
        engine.push_slot(Target::instant(2, 1.1, Lane::Brake, 80));
        let mut sampler = InputSampler::new(5.0);
        sampler.set(Lane::Brake, 0.0);
        sampler.snapshot(0.9);
        engine.process(0.9, &sampler).unwrap();
        sampler.set(Lane::Brake, 1.0);
        sampler.snapshot(1.05);
        assert!(matches!(
            engine.process(1.05, &sampler),
            Err(CoreError::JudgmentWindowViolation { .. })
        ));
    }
}
