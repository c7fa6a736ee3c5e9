use serde::{Deserialize, Serialize};

use crate::drill::{CountdownValue, Judgment};
use crate::exercise::{Lane, TargetId};
use crate::score::ScoreSummary;

/// Every state change of a drill session produces an event.
/// Times are session seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrillEvent {
    CountdownTick {
        value: CountdownValue,
    },
    SessionStarted {
        target_count: usize,
        end_secs: f64,
        seed: Option<u64>,
    },
    Judged {
        target_id: TargetId,
        lane: Lane,
        judgment: Judgment,
        /// Negative when early. `None` when no input qualified.
        delta_secs: Option<f64>,
        at_secs: f64,
        combo: u32,
    },
    TargetsAppended {
        count: usize,
        at_secs: f64,
    },
    Paused {
        at_secs: f64,
    },
    Resumed {
        at_secs: f64,
    },
    Finished {
        at_secs: f64,
        summary: ScoreSummary,
    },
    Aborted {
        at_secs: f64,
        /// Targets dropped without a judgment.
        discarded: usize,
    },
    Reset,
}

impl DrillEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DrillEvent::Finished { .. } | DrillEvent::Aborted { .. })
    }
}
