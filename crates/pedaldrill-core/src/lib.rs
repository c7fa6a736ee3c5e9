//! # Pedaldrill Core Library
//!
//! This library provides the core logic for Pedaldrill, a rhythm trainer for
//! pedals and steering. Targets scroll toward a judgment point; the player
//! presses the matching input on time and every target earns a timing tier.
//! All operations are available via the standalone CLI binary; any GUI is a
//! thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Drill Session**: A tick-driven state machine. The caller invokes
//!   `tick(dt)` from its refresh callback; there are no internal threads
//! - **Judgment Engine**: Rising-edge detection against per-target
//!   evaluation windows, with hold tracking
//! - **Generator**: Seeded random exercises from difficulty presets
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`DrillSession`]: Core session state machine
//! - [`JudgmentEngine`]: Window and tier evaluation
//! - [`TargetGenerator`]: Exercise expansion
//! - [`Config`]: Configuration management
//! - [`FeedbackSink`]: Trait for audio/visual cue delivery

pub mod drill;
pub mod error;
pub mod events;
pub mod exercise;
pub mod feedback;
pub mod generator;
pub mod score;
pub mod simulation;
pub mod storage;

pub use drill::{
    CountdownValue, DrillSession, DrillSettings, JudgeConfig, Judgment, JudgmentEngine,
    SessionSnapshot, SessionState, ToleranceTable,
};
pub use error::{ConfigError, CoreError, ExerciseError, FeedbackError};
pub use events::DrillEvent;
pub use exercise::{
    Difficulty, ExerciseDefinition, ExerciseInput, ExerciseSource, FileSystemSource, Lane, Target,
    TargetId,
};
pub use feedback::{FeedbackSink, NullSink, RecordingSink, TracingSink};
pub use generator::{GeneratedExercise, TargetGenerator};
pub use score::{ScoreAggregator, ScoreSummary, ScoreWeights};
pub use simulation::{run_script, InputScript, RunReport};
pub use storage::Config;
