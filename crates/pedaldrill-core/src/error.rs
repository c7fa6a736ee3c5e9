//! Core error types for pedaldrill-core.
//!
//! This module defines the error hierarchy using thiserror. Exercise
//! problems are reported before a session starts; transition errors are
//! local and non-fatal; window violations abort the running session.

use std::path::PathBuf;
use thiserror::Error;

use crate::drill::SessionState;
use crate::exercise::{Lane, TargetId};

/// Core error type for pedaldrill-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed or empty exercise definition
    #[error("Invalid exercise: {0}")]
    InvalidExercise(#[from] ExerciseError),

    /// Operation not allowed in the current session state
    #[error("Invalid state transition: cannot {action} while {from:?}")]
    InvalidStateTransition {
        from: SessionState,
        action: &'static str,
    },

    /// Two open judging windows on one lane. Fatal to the session.
    #[error("Judgment window violation on {lane}: targets {first} and {second} overlap")]
    JudgmentWindowViolation {
        lane: Lane,
        first: TargetId,
        second: TargetId,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exercise definition errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExerciseError {
    /// No targets at all
    #[error("exercise has no targets")]
    Empty,

    /// Input matched none of the recognized shapes
    #[error("unrecognized exercise shape: {0}")]
    UnrecognizedShape(String),

    /// Recognized shape with missing or mistyped fields
    #[error("malformed exercise: {0}")]
    Malformed(String),

    /// A single target has an out-of-range field
    #[error("target {id}: {reason}")]
    InvalidTarget { id: TargetId, reason: String },

    /// Two targets share an id
    #[error("duplicate target id {0}")]
    DuplicateId(TargetId),

    /// Targets on one lane are not sorted by time
    #[error("targets {previous} and {next} on {lane} are out of order")]
    OutOfOrder {
        lane: Lane,
        previous: TargetId,
        next: TargetId,
    },

    /// Judging windows on one lane touch or overlap
    #[error(
        "targets {previous} and {next} on {lane} are {gap_secs:.3}s apart, need at least {min_gap_secs:.3}s"
    )]
    WindowOverlap {
        lane: Lane,
        previous: TargetId,
        next: TargetId,
        gap_secs: f64,
        min_gap_secs: f64,
    },

    /// Declared duration ends before the last target
    #[error("duration {duration_secs}s is shorter than last target time {last_target_secs}s")]
    DurationTooShort {
        duration_secs: f64,
        last_target_secs: f64,
    },

    /// Duration must be a positive, finite number of seconds
    #[error("duration must be positive, got {0}")]
    NonPositiveDuration(f64),

    /// File handle did not resolve
    #[error("exercise file not found: {0}")]
    FileNotFound(PathBuf),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Home/config directory could not be prepared
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Failure reported by a feedback sink. Logged and ignored by the session.
#[derive(Error, Debug)]
#[error("feedback sink '{sink}' failed: {message}")]
pub struct FeedbackError {
    pub sink: String,
    pub message: String,
}

impl FeedbackError {
    pub fn new(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
