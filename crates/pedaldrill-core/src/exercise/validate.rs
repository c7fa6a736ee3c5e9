//! Invariant checks for pre-built target lists.

use std::collections::{HashMap, HashSet};

use super::{Lane, Target};
use crate::drill::ToleranceTable;
use crate::error::ExerciseError;

/// Time at which the judging window of `target` closes, hold included.
pub fn window_close(target: &Target, table: &ToleranceTable) -> f64 {
    target.time + target.hold_secs() + table.widest_late()
}

/// Validate a target list against the data-model invariants.
///
/// Checks field ranges, unique ids, per-lane time ordering, that judging
/// windows on one lane are strictly separated, and that `duration` (when
/// given) does not end before the last target.
///
/// # Errors
///
/// Returns the first [`ExerciseError`] found.
pub fn validate_targets(
    targets: &[Target],
    duration: Option<f64>,
    table: &ToleranceTable,
) -> Result<(), ExerciseError> {
    if targets.is_empty() {
        return Err(ExerciseError::Empty);
    }

    let mut ids = HashSet::with_capacity(targets.len());
    for target in targets {
        check_fields(target)?;
        if !ids.insert(target.id) {
            return Err(ExerciseError::DuplicateId(target.id));
        }
    }

    // Lane order is taken from the input order, not re-sorted.
    let mut by_lane: HashMap<Lane, Vec<&Target>> = HashMap::new();
    for target in targets {
        by_lane.entry(target.lane).or_default().push(target);
    }

    let span = table.widest_early() + table.widest_late();
    for (lane, lane_targets) in &by_lane {
        for pair in lane_targets.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if next.time < previous.time {
                return Err(ExerciseError::OutOfOrder {
                    lane: *lane,
                    previous: previous.id,
                    next: next.id,
                });
            }
            let gap_secs = next.time - previous.time;
            let min_gap_secs = previous.hold_secs() + span;
            if gap_secs <= min_gap_secs {
                return Err(ExerciseError::WindowOverlap {
                    lane: *lane,
                    previous: previous.id,
                    next: next.id,
                    gap_secs,
                    min_gap_secs,
                });
            }
        }
    }

    if let Some(duration_secs) = duration {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(ExerciseError::NonPositiveDuration(duration_secs));
        }
        let last_target_secs = targets
            .iter()
            .map(|t| t.time)
            .fold(0.0_f64, f64::max);
        if duration_secs < last_target_secs {
            return Err(ExerciseError::DurationTooShort {
                duration_secs,
                last_target_secs,
            });
        }
    }

    Ok(())
}

fn check_fields(target: &Target) -> Result<(), ExerciseError> {
    let invalid = |reason: &str| ExerciseError::InvalidTarget {
        id: target.id,
        reason: reason.to_string(),
    };
    if !target.time.is_finite() || target.time < 0.0 {
        return Err(invalid("time must be a finite number >= 0"));
    }
    if target.intensity > 100 {
        return Err(invalid("intensity must be within 0..=100"));
    }
    if let Some(hold) = target.hold_duration {
        if !hold.is_finite() || hold < 0.0 {
            return Err(invalid("hold duration must be a finite number >= 0"));
        }
    }
    Ok(())
}
