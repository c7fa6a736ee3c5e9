//! Deterministic replay harness for drill sessions.
//!
//! Drives a [`DrillSession`] with scripted input at a fixed tick rate.
//! It enables:
//! - Seed-based reproducible runs
//! - Input recording and replay from JSON files
//! - Regression testing of judging with known inputs

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::drill::{DrillSession, Judgment, SessionState};
use crate::error::Result;
use crate::events::DrillEvent;
use crate::exercise::{ExerciseDefinition, Lane, Target, TargetId};
use crate::score::ScoreSummary;

/// Release margin used by [`InputScript::autoplay`].
const AUTOPLAY_RELEASE_SECS: f64 = 0.1;

/// Keyframes this close ahead of a tick time count as reached, so drift in
/// accumulated tick times does not shift an edge by a whole tick.
const KEYFRAME_SLACK_SECS: f64 = 1e-9;

/// One input change: from `time` on, `lane` reads `value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputKeyframe {
    pub time: f64,
    pub lane: Lane,
    pub value: f64,
}

/// Step-interpolated input per lane. Lanes read 0.0 before their first keyframe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputScript {
    keyframes: Vec<InputKeyframe>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keyframes(mut keyframes: Vec<InputKeyframe>) -> Self {
        // Stable sort keeps the later of two same-time keyframes winning.
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keyframes }
    }

    /// Add a keyframe (builder style).
    pub fn with(mut self, time: f64, lane: Lane, value: f64) -> Self {
        self.push(time, lane, value);
        self
    }

    pub fn push(&mut self, time: f64, lane: Lane, value: f64) {
        let at = self.keyframes.partition_point(|k| k.time <= time);
        self.keyframes.insert(at, InputKeyframe { time, lane, value });
    }

    /// Press and release `lane` over `[from, to)`.
    pub fn press(self, lane: Lane, from: f64, to: f64) -> Self {
        self.with(from, lane, 1.0).with(to, lane, 0.0)
    }

    /// Script that hits every target `offset_secs` after its time and holds
    /// through the full hold duration.
    pub fn autoplay(targets: &[Target], offset_secs: f64) -> Self {
        targets.iter().fold(Self::new(), |script, target| {
            let press = target.time + offset_secs;
            script.press(target.lane, press, press + target.hold_secs() + AUTOPLAY_RELEASE_SECS)
        })
    }

    pub fn keyframes(&self) -> &[InputKeyframe] {
        &self.keyframes
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Distinct lanes the script touches, in lane order.
    pub fn lanes(&self) -> Vec<Lane> {
        let mut lanes: Vec<Lane> = self.keyframes.iter().map(|k| k.lane).collect();
        lanes.sort();
        lanes.dedup();
        lanes
    }

    /// Value of `lane` at `time`.
    pub fn value_at(&self, lane: Lane, time: f64) -> f64 {
        self.keyframes
            .iter()
            .take_while(|k| k.time <= time + KEYFRAME_SLACK_SECS)
            .filter(|k| k.lane == lane)
            .last()
            .map_or(0.0, |k| k.value)
    }

    /// Read a script from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let script: InputScript = serde_json::from_str(&json)?;
        Ok(Self::from_keyframes(script.keyframes))
    }

    /// Write a script as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Outcome of a scripted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: Option<u64>,
    pub state: SessionState,
    pub targets: Vec<Target>,
    pub judgments: BTreeMap<TargetId, Judgment>,
    pub summary: ScoreSummary,
    pub events: Vec<DrillEvent>,
    pub ticks: u64,
}

/// Start `definition` on an idle session and tick it at `tick_hz` until it
/// reaches a terminal state, feeding inputs from `script`.
///
/// Inputs for a tick are sampled at the session time that tick will reach.
///
/// # Errors
///
/// Propagates start errors and judgment window violations; in the latter
/// case the session is left aborted.
pub fn run_script(
    session: &mut DrillSession,
    definition: &ExerciseDefinition,
    seed: Option<u64>,
    script: &InputScript,
    tick_hz: u32,
) -> Result<RunReport> {
    let dt = 1.0 / f64::from(tick_hz.max(1));
    let lanes = script.lanes();
    let mut events = session.start(definition, seed)?;

    let horizon = session.settings().countdown.total_secs() + session.end_secs().unwrap_or(0.0);
    let max_ticks = ((horizon + 1.0) / dt).ceil() as u64 + 1;
    let mut ticks = 0u64;

    while !session.state().is_terminal() {
        if ticks >= max_ticks {
            warn!(ticks, "run did not finish in time, aborting");
            events.push(session.abort()?);
            break;
        }
        let at = if session.state() == SessionState::Active {
            session.elapsed() + dt
        } else {
            session.elapsed()
        };
        for lane in &lanes {
            session.set_input(*lane, script.value_at(*lane, at));
        }
        events.extend(session.tick(dt)?);
        ticks += 1;
    }
    debug!(ticks, state = ?session.state(), "scripted run complete");

    Ok(RunReport {
        seed: session.seed(),
        state: session.state(),
        targets: session.targets().to_vec(),
        judgments: session.judgments().clone(),
        summary: session.score(),
        events,
        ticks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::DrillSettings;
    use crate::exercise::Difficulty;

    #[test]
    fn step_interpolation() {
        let script = InputScript::new()
            .with(1.0, Lane::Brake, 0.8)
            .with(2.0, Lane::Brake, 0.1)
            .with(1.5, Lane::Accelerator, 1.0);
        assert_eq!(script.value_at(Lane::Brake, 0.5), 0.0);
        assert_eq!(script.value_at(Lane::Brake, 1.0), 0.8);
        assert_eq!(script.value_at(Lane::Brake, 1.9), 0.8);
        assert_eq!(script.value_at(Lane::Brake, 2.0), 0.1);
        assert_eq!(script.value_at(Lane::Accelerator, 1.4), 0.0);
        assert_eq!(script.value_at(Lane::Accelerator, 3.0), 1.0);
        assert_eq!(script.lanes(), vec![Lane::Accelerator, Lane::Brake]);
    }

    #[test]
    fn keyframes_stay_sorted() {
        let script = InputScript::from_keyframes(vec![
            InputKeyframe {
                time: 2.0,
                lane: Lane::Brake,
                value: 0.0,
            },
            InputKeyframe {
                time: 1.0,
                lane: Lane::Brake,
                value: 1.0,
            },
        ]);
        let times: Vec<f64> = script.keyframes().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
    }

    #[test]
    fn autoplay_scores_perfect() {
        let targets = vec![
            Target::instant(1, 1.0, Lane::Brake, 60),
            Target::hold(2, 2.0, Lane::Accelerator, 40, 0.5),
        ];
        let def = ExerciseDefinition::PreLoaded {
            targets: targets.clone(),
            duration: None,
        };
        let mut session = DrillSession::new(DrillSettings::default());
        let report = run_script(&mut session, &def, None, &InputScript::autoplay(&targets, 0.0), 60)
            .unwrap();

        assert_eq!(report.state, SessionState::Finished);
        assert_eq!(report.judgments.len(), 2);
        assert!(report.judgments.values().all(|j| *j == Judgment::Perfect));
        assert_eq!(report.summary.max_combo, 2);
        assert!(matches!(report.events.last(), Some(DrillEvent::Finished { .. })));
    }

    #[test]
    fn silence_misses_everything() {
        let def = ExerciseDefinition::Random {
            difficulty: Difficulty::Medium,
            duration: 12.0,
        };
        let mut session = DrillSession::new(DrillSettings::default());
        let report = run_script(&mut session, &def, Some(9), &InputScript::new(), 60).unwrap();
        assert_eq!(report.seed, Some(9));
        assert!(!report.targets.is_empty());
        assert_eq!(report.judgments.len(), report.targets.len());
        assert!(report.judgments.values().all(|j| j.is_miss()));
        assert_eq!(report.summary.total, 0);
    }

    #[test]
    fn script_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        let script = InputScript::new().press(Lane::Clutch, 0.5, 1.0);
        script.save(&path).unwrap();
        assert_eq!(InputScript::load(&path).unwrap(), script);
    }
}
