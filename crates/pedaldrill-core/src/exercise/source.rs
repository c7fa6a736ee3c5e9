//! Exercise Source: resolves a requested drill into an [`ExerciseDefinition`].
//!
//! Three input shapes are recognized:
//!
//! ```text
//! {"type": "random", "difficulty": "easy", "duration": 30}
//! {"file": "warmup.json"}
//! {"targets": [...], "duration": 12}
//! ```
//!
//! Anything else is rejected with [`ExerciseError::UnrecognizedShape`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{validate_targets, Difficulty, ExerciseDefinition, Target};
use crate::drill::ToleranceTable;
use crate::error::ExerciseError;

/// A drill request as handed over by the menu layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExerciseInput {
    Random { difficulty: Difficulty, duration: f64 },
    File { file: PathBuf },
    Targets { targets: Vec<Target>, duration: Option<f64> },
}

#[derive(Deserialize)]
struct RandomShape {
    difficulty: Difficulty,
    duration: f64,
}

#[derive(Deserialize)]
struct FileShape {
    file: PathBuf,
}

#[derive(Deserialize)]
struct TargetsShape {
    targets: Vec<Target>,
    #[serde(default)]
    duration: Option<f64>,
}

impl ExerciseInput {
    /// Classify a JSON value into one of the recognized shapes.
    ///
    /// # Errors
    ///
    /// `UnrecognizedShape` when no shape matches, `Malformed` when a shape
    /// matches but its fields do not deserialize.
    pub fn from_json(value: &Value) -> Result<Self, ExerciseError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ExerciseError::UnrecognizedShape("expected a JSON object".into()))?;

        let malformed = |e: serde_json::Error| ExerciseError::Malformed(e.to_string());

        match obj.get("type").and_then(Value::as_str) {
            Some("random") => {
                let shape: RandomShape = serde_json::from_value(value.clone()).map_err(malformed)?;
                return Ok(ExerciseInput::Random {
                    difficulty: shape.difficulty,
                    duration: shape.duration,
                });
            }
            Some(other) => {
                return Err(ExerciseError::UnrecognizedShape(format!(
                    "unknown exercise type '{other}'"
                )))
            }
            None => {}
        }

        if obj.contains_key("file") {
            let shape: FileShape = serde_json::from_value(value.clone()).map_err(malformed)?;
            return Ok(ExerciseInput::File { file: shape.file });
        }

        if obj.contains_key("targets") {
            let shape: TargetsShape = serde_json::from_value(value.clone()).map_err(malformed)?;
            return Ok(ExerciseInput::Targets {
                targets: shape.targets,
                duration: shape.duration,
            });
        }

        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        Err(ExerciseError::UnrecognizedShape(format!(
            "no 'type', 'file' or 'targets' key (found: {keys:?})"
        )))
    }

    /// Parse JSON text, then classify it.
    ///
    /// # Errors
    ///
    /// Same as [`ExerciseInput::from_json`]; invalid JSON is `Malformed`.
    pub fn from_json_str(text: &str) -> Result<Self, ExerciseError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ExerciseError::Malformed(e.to_string()))?;
        Self::from_json(&value)
    }
}

/// Resolves drill requests into definitions.
///
/// Implementations must hand back already-validated targets or fail; the
/// session never sees a definition the source could not vouch for.
pub trait ExerciseSource {
    fn load(&self, input: &ExerciseInput) -> Result<ExerciseDefinition, ExerciseError>;
}

/// Source that resolves `{"file": ...}` handles against a directory on disk.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
    table: ToleranceTable,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>, table: ToleranceTable) -> Self {
        Self {
            root: root.into(),
            table,
        }
    }

    fn resolve(&self, handle: &Path) -> PathBuf {
        if handle.is_absolute() {
            handle.to_path_buf()
        } else {
            self.root.join(handle)
        }
    }

    fn read_file(&self, handle: &Path) -> Result<TargetsShape, ExerciseError> {
        let path = self.resolve(handle);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExerciseError::FileNotFound(path.clone())
            } else {
                ExerciseError::Malformed(format!("{}: {e}", path.display()))
            }
        })?;
        serde_json::from_str(&text)
            .map_err(|e| ExerciseError::Malformed(format!("{}: {e}", path.display())))
    }
}

impl ExerciseSource for FileSystemSource {
    fn load(&self, input: &ExerciseInput) -> Result<ExerciseDefinition, ExerciseError> {
        match input {
            ExerciseInput::Random {
                difficulty,
                duration,
            } => {
                if !duration.is_finite() || *duration <= 0.0 {
                    return Err(ExerciseError::NonPositiveDuration(*duration));
                }
                Ok(ExerciseDefinition::Random {
                    difficulty: *difficulty,
                    duration: *duration,
                })
            }
            ExerciseInput::File { file } => {
                let shape = self.read_file(file)?;
                validate_targets(&shape.targets, shape.duration, &self.table)?;
                Ok(ExerciseDefinition::FileBacked {
                    targets: shape.targets,
                    duration: shape.duration,
                })
            }
            ExerciseInput::Targets { targets, duration } => {
                validate_targets(targets, *duration, &self.table)?;
                Ok(ExerciseDefinition::PreLoaded {
                    targets: targets.clone(),
                    duration: *duration,
                })
            }
        }
    }
}
