//! Drill session state machine.
//!
//! The session owns all per-run state: targets, judgments, score, clock,
//! sampler and judging engine. It does not use internal threads; the host
//! calls [`DrillSession::tick`] from its refresh or timer callback. Each
//! tick runs in a fixed order: clock, input snapshot, judging, score,
//! completion check.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Countdown -> Active -> (Finished | Aborted) -> Idle (reset)
//!            \____________\__________> Aborted
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = DrillSession::new(settings);
//! session.start(&definition, Some(seed))?;
//! // In the host's frame callback:
//! session.set_input(Lane::Brake, pedal_value);
//! let events = session.tick(dt)?;
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::countdown::{Countdown, CountdownConfig, CountdownValue};
use super::judge::{JudgeConfig, Judgment, JudgmentEngine, Resolution};
use super::sampler::InputSampler;
use super::transport::{Transport, TransportConfig};
use crate::error::{CoreError, Result};
use crate::events::DrillEvent;
use crate::exercise::{ExerciseDefinition, Lane, Target, TargetId};
use crate::feedback::{FeedbackSink, NullSink};
use crate::generator::{GeneratorConfig, TargetGenerator};
use crate::score::{ScoreAggregator, ScoreSummary, ScoreWeights};

/// Look-ahead used by [`DrillSession::snapshot`] for upcoming targets.
const SNAPSHOT_HORIZON_SECS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Countdown,
    Active,
    Finished,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Finished | SessionState::Aborted)
    }
}

/// Everything a session needs besides the exercise itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrillSettings {
    pub judge: JudgeConfig,
    pub scoring: ScoreWeights,
    pub countdown: CountdownConfig,
    pub transport: TransportConfig,
    pub generator: GeneratorConfig,
}

/// Read-only view for inspector and debug panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub paused: bool,
    pub elapsed_secs: f64,
    pub end_secs: Option<f64>,
    pub countdown: Option<CountdownValue>,
    /// Seconds left before judging starts; set only while counting down.
    pub countdown_remaining_secs: Option<f64>,
    pub seed: Option<u64>,
    pub total_targets: usize,
    pub judged_targets: usize,
    pub upcoming: Vec<Target>,
    pub inputs: Vec<(Lane, f64)>,
    pub score: ScoreSummary,
    pub started_at: Option<DateTime<Utc>>,
}

pub struct DrillSession {
    id: Uuid,
    settings: DrillSettings,
    state: SessionState,
    definition: Option<ExerciseDefinition>,
    seed: Option<u64>,
    targets: Vec<Target>,
    judgments: BTreeMap<TargetId, Judgment>,
    end_secs: Option<f64>,
    started_at: Option<DateTime<Utc>>,
    transport: Transport,
    countdown: Option<Countdown>,
    sampler: InputSampler,
    engine: Option<JudgmentEngine>,
    score: ScoreAggregator,
    sink: Box<dyn FeedbackSink>,
}

impl std::fmt::Debug for DrillSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrillSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("elapsed", &self.transport.elapsed())
            .field("targets", &self.targets.len())
            .field("judged", &self.judgments.len())
            .finish_non_exhaustive()
    }
}

impl DrillSession {
    /// Create an idle session that discards feedback.
    pub fn new(settings: DrillSettings) -> Self {
        Self::with_sink(settings, Box::new(NullSink))
    }

    pub fn with_sink(settings: DrillSettings, sink: Box<dyn FeedbackSink>) -> Self {
        let score = ScoreAggregator::new(settings.scoring.clone());
        Self {
            id: Uuid::new_v4(),
            settings,
            state: SessionState::Idle,
            definition: None,
            seed: None,
            targets: Vec::new(),
            judgments: BTreeMap::new(),
            end_secs: None,
            started_at: None,
            transport: Transport::new(),
            countdown: None,
            sampler: InputSampler::default(),
            engine: None,
            score,
            sink,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn settings(&self) -> &DrillSettings {
        &self.settings
    }

    pub fn definition(&self) -> Option<&ExerciseDefinition> {
        self.definition.as_ref()
    }

    /// Seed used for the current targets; `None` for pre-built exercises.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn elapsed(&self) -> f64 {
        self.transport.elapsed()
    }

    pub fn is_paused(&self) -> bool {
        self.transport.is_paused()
    }

    pub fn end_secs(&self) -> Option<f64> {
        self.end_secs
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn judgments(&self) -> &BTreeMap<TargetId, Judgment> {
        &self.judgments
    }

    pub fn judgment(&self, id: TargetId) -> Option<Judgment> {
        self.judgments.get(&id).copied()
    }

    pub fn score(&self) -> ScoreSummary {
        self.score.summary()
    }

    pub fn input(&self, lane: Lane) -> f64 {
        self.sampler.sample(lane)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.transport.elapsed();
        let from = now - self.settings.judge.tolerance.widest_early();
        let upcoming = self
            .engine
            .as_ref()
            .map(|engine| {
                engine
                    .upcoming(from, now + SNAPSHOT_HORIZON_SECS)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        SessionSnapshot {
            session_id: self.id,
            state: self.state,
            paused: self.transport.is_paused(),
            elapsed_secs: now,
            end_secs: self.end_secs,
            countdown: self.countdown.as_ref().and_then(Countdown::current),
            countdown_remaining_secs: self
                .countdown
                .as_ref()
                .filter(|_| self.state == SessionState::Countdown)
                .map(Countdown::remaining_secs),
            seed: self.seed,
            total_targets: self.targets.len(),
            judged_targets: self.judgments.len(),
            upcoming,
            inputs: self.sampler.current_values(),
            score: self.score.summary(),
            started_at: self.started_at,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Feed the latest raw reading for a lane. Picked up at the next tick.
    pub fn set_input(&mut self, lane: Lane, value: f64) {
        self.sampler.set(lane, value);
    }

    /// Load an exercise and enter the countdown.
    ///
    /// # Errors
    ///
    /// `InvalidStateTransition` unless idle; `InvalidExercise` when the
    /// definition does not produce valid targets (the session stays idle).
    pub fn start(&mut self, definition: &ExerciseDefinition, seed: Option<u64>) -> Result<Vec<DrillEvent>> {
        self.expect_state(&[SessionState::Idle], "start")?;

        let generator = TargetGenerator::new(
            self.settings.generator.clone(),
            self.settings.judge.tolerance.clone(),
        );
        let generated = generator.generate(definition, seed).map_err(|e| {
            warn!(error = %e, kind = definition.kind_str(), "exercise rejected");
            CoreError::from(e)
        })?;

        self.definition = Some(definition.clone());
        self.seed = generated.seed;
        self.targets = generated.targets;
        self.end_secs = Some(generated.end_secs);
        self.started_at = Some(Utc::now());
        self.state = SessionState::Countdown;
        info!(
            session_id = %self.id,
            kind = definition.kind_str(),
            targets = self.targets.len(),
            end_secs = generated.end_secs,
            seed = ?self.seed,
            "drill countdown started"
        );

        let mut countdown = Countdown::new(self.settings.countdown.clone());
        let values = countdown.begin();
        self.countdown = Some(countdown);
        let mut events = self.announce_countdown(values);
        if self.countdown.as_ref().is_some_and(Countdown::is_complete) {
            events.push(self.activate());
        }
        Ok(events)
    }

    /// Advance the session by `dt` seconds.
    ///
    /// # Errors
    ///
    /// `JudgmentWindowViolation` when the engine detects overlapping open
    /// windows; the session is aborted before the error is returned.
    pub fn tick(&mut self, dt: f64) -> Result<Vec<DrillEvent>> {
        match self.state {
            SessionState::Countdown => Ok(self.tick_countdown(dt)),
            SessionState::Active => self.tick_active(dt),
            SessionState::Idle | SessionState::Finished | SessionState::Aborted => Ok(Vec::new()),
        }
    }

    /// Tick by the configured fixed interval.
    pub fn tick_fixed(&mut self) -> Result<Vec<DrillEvent>> {
        self.tick(self.settings.transport.tick_secs())
    }

    pub fn pause(&mut self) -> Result<DrillEvent> {
        self.expect_state(&[SessionState::Active], "pause")?;
        self.transport.pause();
        debug!(at = self.elapsed(), "drill paused");
        Ok(DrillEvent::Paused {
            at_secs: self.elapsed(),
        })
    }

    pub fn resume(&mut self) -> Result<DrillEvent> {
        self.expect_state(&[SessionState::Active], "resume")?;
        self.transport.resume();
        debug!(at = self.elapsed(), "drill resumed");
        Ok(DrillEvent::Resumed {
            at_secs: self.elapsed(),
        })
    }

    /// Cancel the drill. Open windows are dropped without judgments.
    pub fn abort(&mut self) -> Result<DrillEvent> {
        self.expect_state(&[SessionState::Countdown, SessionState::Active], "abort")?;
        Ok(self.abort_now())
    }

    /// Return to idle from a terminal state, clearing per-run data.
    pub fn reset(&mut self) -> Result<DrillEvent> {
        self.expect_state(
            &[SessionState::Idle, SessionState::Finished, SessionState::Aborted],
            "reset",
        )?;
        self.state = SessionState::Idle;
        self.definition = None;
        self.seed = None;
        self.targets.clear();
        self.judgments.clear();
        self.end_secs = None;
        self.started_at = None;
        self.transport.reset();
        self.countdown = None;
        self.sampler.clear();
        self.engine = None;
        self.score.reset();
        debug!(session_id = %self.id, "drill reset");
        Ok(DrillEvent::Reset)
    }

    /// Add targets to an active drill, for streamed exercise sources.
    ///
    /// # Errors
    ///
    /// `InvalidExercise` for a malformed batch (session unaffected);
    /// `JudgmentWindowViolation` when a new window overlaps a loaded one,
    /// which aborts the session.
    pub fn append_targets(&mut self, targets: Vec<Target>) -> Result<DrillEvent> {
        self.expect_state(&[SessionState::Active], "append targets")?;
        let Some(engine) = self.engine.as_mut() else {
            return Err(self.transition_error("append targets"));
        };
        match engine.append(targets.clone()) {
            Ok(()) => {}
            Err(err @ CoreError::JudgmentWindowViolation { .. }) => {
                warn!(error = %err, "streamed targets overlap, aborting");
                self.abort_now();
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        let count = targets.len();
        let last_close = targets
            .iter()
            .map(|t| crate::exercise::window_close(t, &self.settings.judge.tolerance))
            .fold(0.0, f64::max);
        self.targets.extend(targets);
        self.targets
            .sort_by(|a, b| a.time.total_cmp(&b.time).then(a.lane.cmp(&b.lane)));
        self.end_secs = self.end_secs.map(|end| end.max(last_close));
        self.refresh_retention();
        Ok(DrillEvent::TargetsAppended {
            count,
            at_secs: self.elapsed(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn tick_countdown(&mut self, dt: f64) -> Vec<DrillEvent> {
        let values = match self.countdown.as_mut() {
            Some(countdown) => countdown.advance(dt),
            None => Vec::new(),
        };
        let mut events = self.announce_countdown(values);
        if self.countdown.as_ref().map_or(true, Countdown::is_complete) {
            events.push(self.activate());
        }
        events
    }

    fn tick_active(&mut self, dt: f64) -> Result<Vec<DrillEvent>> {
        if !self.transport.is_advancing() {
            return Ok(Vec::new());
        }
        let now = self.transport.advance(dt);
        self.sampler.snapshot(now);

        let resolutions = match self.engine.as_mut() {
            Some(engine) => engine.process(now, &self.sampler),
            None => Ok(Vec::new()),
        };
        let resolutions = match resolutions {
            Ok(resolutions) => resolutions,
            Err(err) => {
                warn!(error = %err, "judgment window violation, aborting");
                self.abort_now();
                return Err(err);
            }
        };

        let mut events = Vec::new();
        for resolution in resolutions {
            events.extend(self.record(resolution));
        }

        let end = self.end_secs.unwrap_or(0.0);
        if now + 1e-9 >= end {
            let forced = self
                .engine
                .as_mut()
                .map(|engine| engine.force_resolve(now))
                .unwrap_or_default();
            for resolution in forced {
                events.extend(self.record(resolution));
            }
            if self.judgments.len() == self.targets.len() {
                events.push(self.finish(now));
            }
        }
        Ok(events)
    }

    fn activate(&mut self) -> DrillEvent {
        let mut engine = JudgmentEngine::with_targets(self.settings.judge.clone(), &self.targets);
        self.sampler.snapshot(0.0);
        engine.prime(&self.sampler);
        self.engine = Some(engine);
        self.refresh_retention();
        self.transport.reset();
        self.transport.start();
        self.state = SessionState::Active;
        info!(session_id = %self.id, targets = self.targets.len(), "drill active");
        DrillEvent::SessionStarted {
            target_count: self.targets.len(),
            end_secs: self.end_secs.unwrap_or(0.0),
            seed: self.seed,
        }
    }

    fn finish(&mut self, now: f64) -> DrillEvent {
        self.transport.stop();
        self.state = SessionState::Finished;
        let summary = self.score.summary();
        info!(
            session_id = %self.id,
            total = summary.total,
            max_combo = summary.max_combo,
            accuracy = summary.accuracy_pct,
            "drill finished"
        );
        DrillEvent::Finished {
            at_secs: now,
            summary,
        }
    }

    fn abort_now(&mut self) -> DrillEvent {
        let at_secs = self.transport.elapsed();
        self.transport.stop();
        self.countdown = None;
        self.engine = None;
        self.state = SessionState::Aborted;
        let discarded = self.targets.len() - self.judgments.len();
        info!(session_id = %self.id, at_secs, discarded, "drill aborted");
        DrillEvent::Aborted { at_secs, discarded }
    }

    /// Store a judgment once and fan it out to score and sink.
    fn record(&mut self, resolution: Resolution) -> Option<DrillEvent> {
        let id = resolution.target.id;
        if self.judgments.contains_key(&id) {
            warn!(target_id = id, "duplicate judgment ignored");
            return None;
        }
        self.judgments.insert(id, resolution.judgment);
        self.score.record(resolution.judgment);
        if let Err(e) = self.sink.on_judgment(resolution.judgment, &resolution.target) {
            warn!(error = %e, "feedback sink failed");
        }
        debug!(
            target_id = id,
            judgment = ?resolution.judgment,
            delta = ?resolution.delta_secs,
            "judged"
        );
        Some(DrillEvent::Judged {
            target_id: id,
            lane: resolution.target.lane,
            judgment: resolution.judgment,
            delta_secs: resolution.delta_secs,
            at_secs: resolution.at_secs,
            combo: self.score.combo(),
        })
    }

    fn announce_countdown(&mut self, values: Vec<CountdownValue>) -> Vec<DrillEvent> {
        values
            .into_iter()
            .map(|value| {
                if let Err(e) = self.sink.on_countdown_tick(value) {
                    warn!(error = %e, "feedback sink failed");
                }
                DrillEvent::CountdownTick { value }
            })
            .collect()
    }

    fn refresh_retention(&mut self) {
        if let Some(engine) = &self.engine {
            // One extra second covers the tick that straddles a window edge.
            self.sampler.set_retention(engine.retention_secs() + 1.0);
        }
    }

    fn expect_state(&self, allowed: &[SessionState], action: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.transition_error(action))
        }
    }

    fn transition_error(&self, action: &'static str) -> CoreError {
        warn!(state = ?self.state, action, "rejected state transition");
        CoreError::InvalidStateTransition {
            from: self.state,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedbackError;
    use crate::exercise::Difficulty;
    use crate::feedback::RecordingSink;

    fn preloaded(targets: Vec<Target>, duration: Option<f64>) -> ExerciseDefinition {
        ExerciseDefinition::PreLoaded { targets, duration }
    }

    fn no_countdown() -> DrillSettings {
        DrillSettings {
            countdown: CountdownConfig {
                from: 0,
                step_secs: 1.0,
            },
            ..DrillSettings::default()
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut session = DrillSession::new(DrillSettings::default());
        assert_eq!(session.state(), SessionState::Idle);

        let def = ExerciseDefinition::Random {
            difficulty: Difficulty::Easy,
            duration: 10.0,
        };
        let events = session.start(&def, Some(1)).unwrap();
        assert_eq!(session.state(), SessionState::Countdown);
        assert_eq!(
            events,
            vec![DrillEvent::CountdownTick {
                value: CountdownValue::Count(3)
            }]
        );

        session.tick(3.0).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.elapsed(), 0.0);

        session.pause().unwrap();
        assert!(session.tick(1.0).unwrap().is_empty());
        assert_eq!(session.elapsed(), 0.0);
        session.resume().unwrap();
        session.tick(0.5).unwrap();
        assert!((session.elapsed() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn countdown_does_not_advance_transport() {
        let mut session = DrillSession::new(DrillSettings::default());
        let def = preloaded(vec![Target::instant(1, 1.0, Lane::Brake, 50)], None);
        session.start(&def, None).unwrap();
        session.tick(1.0).unwrap();
        session.tick(1.0).unwrap();
        assert_eq!(session.state(), SessionState::Countdown);
        assert_eq!(session.elapsed(), 0.0);
        assert!(session.judgments().is_empty());
        let remaining = session.snapshot().countdown_remaining_secs.unwrap();
        assert!((remaining - 1.0).abs() < 1e-9);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = DrillSession::new(DrillSettings::default());
        let def = preloaded(vec![Target::instant(1, 1.0, Lane::Brake, 50)], None);
        session.start(&def, None).unwrap();
        let err = session.start(&def, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidStateTransition {
                from: SessionState::Countdown,
                action: "start"
            }
        ));
    }

    #[test]
    fn invalid_exercise_keeps_session_idle() {
        let mut session = DrillSession::new(DrillSettings::default());
        let err = session.start(&preloaded(vec![], None), None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidExercise(_)));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.targets().is_empty());
    }

    #[test]
    fn abort_discards_open_windows() {
        let sink = RecordingSink::new();
        let mut session = DrillSession::with_sink(no_countdown(), Box::new(sink.clone()));
        let def = preloaded(
            vec![
                Target::instant(1, 0.5, Lane::Brake, 50),
                Target::instant(2, 5.0, Lane::Brake, 50),
            ],
            None,
        );
        session.start(&def, None).unwrap();
        for _ in 0..100 {
            session.tick(0.01).unwrap();
        }
        // Target 1 has timed out, target 2 is still pending.
        assert_eq!(session.judgments().len(), 1);

        let event = session.abort().unwrap();
        assert_eq!(
            event,
            DrillEvent::Aborted {
                at_secs: session.elapsed(),
                discarded: 1
            }
        );
        assert_eq!(session.state(), SessionState::Aborted);
        assert!(session.tick(10.0).unwrap().is_empty());
        assert_eq!(sink.judgments().len(), 1);
    }

    #[test]
    fn abort_is_rejected_when_idle() {
        let mut session = DrillSession::new(DrillSettings::default());
        assert!(matches!(
            session.abort(),
            Err(CoreError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn reset_only_from_terminal_or_idle() {
        let mut session = DrillSession::new(no_countdown());
        assert!(session.reset().is_ok());
        let def = preloaded(vec![Target::instant(1, 1.0, Lane::Brake, 50)], None);
        session.start(&def, None).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.reset().is_err());
        session.abort().unwrap();
        assert!(session.reset().is_ok());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.targets().is_empty());
        assert_eq!(session.score().judged, 0);
    }

    #[test]
    fn finishes_after_end_with_all_targets_judged() {
        let mut session = DrillSession::new(no_countdown());
        let def = preloaded(vec![Target::instant(1, 1.0, Lane::Brake, 50)], Some(2.0));
        session.start(&def, None).unwrap();

        let mut events = Vec::new();
        for _ in 0..300 {
            events.extend(session.tick(0.01).unwrap());
            if session.state().is_terminal() {
                break;
            }
        }
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(session.judgment(1), Some(Judgment::Miss));
        assert!(matches!(events.last(), Some(DrillEvent::Finished { .. })));
        assert!(session.elapsed() >= 2.0 - 1e-6);
    }

    #[test]
    fn end_forces_open_holds_to_miss() {
        let mut session = DrillSession::new(no_countdown());
        // Duration cuts the hold short.
        let def = preloaded(vec![Target::hold(1, 1.0, Lane::Brake, 50, 2.0)], Some(1.5));
        session.start(&def, None).unwrap();
        for _ in 0..200 {
            if session.elapsed() >= 0.99 {
                session.set_input(Lane::Brake, 1.0);
            }
            session.tick(0.01).unwrap();
            if session.state().is_terminal() {
                break;
            }
        }
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(session.judgment(1), Some(Judgment::Miss));
    }

    #[test]
    fn append_overlapping_targets_aborts() {
        let mut session = DrillSession::new(no_countdown());
        let def = preloaded(vec![Target::instant(1, 1.0, Lane::Brake, 50)], Some(10.0));
        session.start(&def, None).unwrap();

        let event = session
            .append_targets(vec![Target::instant(2, 4.0, Lane::Brake, 50)])
            .unwrap();
        assert_eq!(event, DrillEvent::TargetsAppended { count: 1, at_secs: 0.0 });
        assert_eq!(session.targets().len(), 2);

        let err = session
            .append_targets(vec![Target::instant(3, 4.1, Lane::Brake, 50)])
            .unwrap_err();
        assert!(matches!(err, CoreError::JudgmentWindowViolation { .. }));
        assert_eq!(session.state(), SessionState::Aborted);
    }

    #[test]
    fn append_extends_end_time() {
        let mut session = DrillSession::new(no_countdown());
        let def = preloaded(vec![Target::instant(1, 1.0, Lane::Brake, 50)], None);
        session.start(&def, None).unwrap();
        session
            .append_targets(vec![Target::instant(2, 6.0, Lane::Accelerator, 50)])
            .unwrap();
        assert!((session.end_secs().unwrap() - 6.2).abs() < 1e-9);
    }

    struct FailingSink;

    impl FeedbackSink for FailingSink {
        fn on_judgment(&mut self, _: Judgment, _: &Target) -> std::result::Result<(), FeedbackError> {
            Err(FeedbackError::new("failing", "speaker unplugged"))
        }

        fn on_countdown_tick(&mut self, _: CountdownValue) -> std::result::Result<(), FeedbackError> {
            Err(FeedbackError::new("failing", "speaker unplugged"))
        }
    }

    #[test]
    fn sink_failures_do_not_affect_judging() {
        let mut session = DrillSession::with_sink(DrillSettings::default(), Box::new(FailingSink));
        let def = preloaded(vec![Target::instant(1, 0.5, Lane::Brake, 50)], None);
        session.start(&def, None).unwrap();
        for _ in 0..500 {
            session.tick(0.01).unwrap();
        }
        assert_eq!(session.state(), SessionState::Finished);
        assert_eq!(session.judgments().len(), 1);
    }

    #[test]
    fn snapshot_reports_upcoming_targets() {
        let mut session = DrillSession::new(no_countdown());
        let def = preloaded(
            vec![
                Target::instant(1, 1.0, Lane::Brake, 50),
                Target::instant(2, 10.0, Lane::Accelerator, 50),
            ],
            None,
        );
        session.start(&def, None).unwrap();
        session.set_input(Lane::Brake, 0.3);
        session.tick(0.1).unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.state, SessionState::Active);
        assert_eq!(snap.total_targets, 2);
        assert_eq!(snap.upcoming.len(), 1);
        assert_eq!(snap.upcoming[0].id, 1);
        assert_eq!(snap.inputs, vec![(Lane::Brake, 0.3)]);
        assert!(snap.started_at.is_some());
        assert_eq!(snap.countdown_remaining_secs, None);
    }
}
