//! Feedback sinks.
//!
//! The session reports judgments and countdown values to an injected
//! [`FeedbackSink`]. Delivery is fire-and-forget: a failing sink is logged
//! and ignored, it never affects judging.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::drill::{CountdownValue, Judgment};
use crate::error::FeedbackError;
use crate::exercise::Target;

pub trait FeedbackSink {
    fn on_judgment(&mut self, judgment: Judgment, target: &Target) -> Result<(), FeedbackError>;

    fn on_countdown_tick(&mut self, value: CountdownValue) -> Result<(), FeedbackError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn on_judgment(&mut self, _judgment: Judgment, _target: &Target) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn on_countdown_tick(&mut self, _value: CountdownValue) -> Result<(), FeedbackError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Judgment { judgment: Judgment, target: Target },
    Countdown { value: CountdownValue },
}

/// Keeps every notification. Clones share one log, so a test can hold a
/// handle while the session owns the sink.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    pub fn judgments(&self) -> Vec<(Judgment, Target)> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Judgment { judgment, target } => Some((*judgment, target.clone())),
                Notification::Countdown { .. } => None,
            })
            .collect()
    }

    pub fn countdown(&self) -> Vec<CountdownValue> {
        self.log
            .borrow()
            .iter()
            .filter_map(|n| match n {
                Notification::Countdown { value } => Some(*value),
                Notification::Judgment { .. } => None,
            })
            .collect()
    }
}

impl FeedbackSink for RecordingSink {
    fn on_judgment(&mut self, judgment: Judgment, target: &Target) -> Result<(), FeedbackError> {
        self.log.borrow_mut().push(Notification::Judgment {
            judgment,
            target: target.clone(),
        });
        Ok(())
    }

    fn on_countdown_tick(&mut self, value: CountdownValue) -> Result<(), FeedbackError> {
        self.log.borrow_mut().push(Notification::Countdown { value });
        Ok(())
    }
}

/// Announcement text for a judgment, as a voice cue would speak it.
pub fn announcement(judgment: Judgment, target: &Target) -> String {
    match judgment {
        Judgment::Miss => format!("Missed {}", target.lane),
        other => format!("{}!", other.label()),
    }
}

/// Turns notifications into announcement phrases and logs them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FeedbackSink for TracingSink {
    fn on_judgment(&mut self, judgment: Judgment, target: &Target) -> Result<(), FeedbackError> {
        info!(
            target_id = target.id,
            lane = %target.lane,
            "{}",
            announcement(judgment, target)
        );
        Ok(())
    }

    fn on_countdown_tick(&mut self, value: CountdownValue) -> Result<(), FeedbackError> {
        match value {
            CountdownValue::Go => info!("Go!"),
            CountdownValue::Count(n) => info!("{n}"),
        }
        Ok(())
    }
}
