//! Exercise definitions and the targets they produce.
//!
//! An [`ExerciseDefinition`] is what a drill selection resolves to. Random
//! definitions are expanded by the [`crate::generator`]; file-backed and
//! pre-loaded ones carry their targets already and are only validated.

mod source;
mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use source::{ExerciseInput, ExerciseSource, FileSystemSource};
pub use validate::{validate_targets, window_close};

pub type TargetId = u32;

/// Independent input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    Accelerator,
    Brake,
    Clutch,
    Steering,
}

impl Lane {
    pub const COUNT: usize = 4;
    pub const ALL: [Lane; Lane::COUNT] = [Lane::Accelerator, Lane::Brake, Lane::Clutch, Lane::Steering];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Accelerator => "accelerator",
            Lane::Brake => "brake",
            Lane::Clutch => "clutch",
            Lane::Steering => "steering",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A scheduled timing event on a lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    /// Seconds from session start.
    pub time: f64,
    pub lane: Lane,
    /// 0..=100
    pub intensity: u8,
    /// Seconds the input must stay above threshold. Absent or zero means instantaneous.
    #[serde(default, alias = "holdDuration", skip_serializing_if = "Option::is_none")]
    pub hold_duration: Option<f64>,
}

impl Target {
    pub fn instant(id: TargetId, time: f64, lane: Lane, intensity: u8) -> Self {
        Self {
            id,
            time,
            lane,
            intensity,
            hold_duration: None,
        }
    }

    pub fn hold(id: TargetId, time: f64, lane: Lane, intensity: u8, hold_secs: f64) -> Self {
        Self {
            id,
            time,
            lane,
            intensity,
            hold_duration: Some(hold_secs),
        }
    }

    /// Hold length in seconds, zero for instantaneous targets.
    pub fn hold_secs(&self) -> f64 {
        self.hold_duration.unwrap_or(0.0).max(0.0)
    }

    pub fn is_hold(&self) -> bool {
        self.hold_secs() > 0.0
    }
}

/// What a drill selection resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExerciseDefinition {
    Random {
        difficulty: Difficulty,
        /// Seconds.
        duration: f64,
    },
    FileBacked {
        targets: Vec<Target>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
    },
    PreLoaded {
        targets: Vec<Target>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
    },
}

impl ExerciseDefinition {
    /// Declared duration, if any.
    pub fn duration(&self) -> Option<f64> {
        match self {
            ExerciseDefinition::Random { duration, .. } => Some(*duration),
            ExerciseDefinition::FileBacked { duration, .. }
            | ExerciseDefinition::PreLoaded { duration, .. } => *duration,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            ExerciseDefinition::Random { .. } => "random",
            ExerciseDefinition::FileBacked { .. } => "file_backed",
            ExerciseDefinition::PreLoaded { .. } => "pre_loaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_accepts_camel_case_hold_duration() {
        let json = r#"{"id": 1, "time": 2.0, "lane": "brake", "intensity": 80, "holdDuration": 0.4}"#;
        let target: Target = serde_json::from_str(json).unwrap();
        assert_eq!(target.lane, Lane::Brake);
        assert_eq!(target.hold_secs(), 0.4);
        assert!(target.is_hold());
    }

    #[test]
    fn zero_hold_is_instantaneous() {
        let target = Target::hold(1, 1.0, Lane::Accelerator, 50, 0.0);
        assert!(!target.is_hold());
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn definition_duration() {
        let def = ExerciseDefinition::Random {
            difficulty: Difficulty::Easy,
            duration: 10.0,
        };
        assert_eq!(def.duration(), Some(10.0));
        let def = ExerciseDefinition::PreLoaded {
            targets: vec![],
            duration: None,
        };
        assert_eq!(def.duration(), None);
    }
}
