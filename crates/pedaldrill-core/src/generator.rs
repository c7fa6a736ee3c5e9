//! Target generation.
//!
//! Random definitions are expanded on a beat grid: each beat places a
//! target on one free lane, and with `chord_probability` on further free
//! lanes at the same instant. A lane is free once the previous target on
//! it is at least `min_spacing_secs` behind and its judging window has
//! closed. Pre-built definitions pass through after validation.
//!
//! Generation is seeded with `rand_pcg::Mcg128Xsl64`, so a seed fully
//! determines the output.

use std::collections::HashMap;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::drill::ToleranceTable;
use crate::error::ExerciseError;
use crate::exercise::{validate_targets, window_close, Difficulty, ExerciseDefinition, Lane, Target};

/// Extra clearance between one target's window close and the next one's open.
const WINDOW_SEPARATION_SECS: f64 = 0.05;

/// Density and shape knobs for one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPreset {
    /// Minimum gap between consecutive targets on one lane.
    pub min_spacing_secs: f64,
    /// Range of the beat-to-beat gap across all lanes.
    pub beat_min_secs: f64,
    pub beat_max_secs: f64,
    /// Chance of each additional free lane joining a beat.
    pub chord_probability: f64,
    pub hold_probability: f64,
    pub hold_min_secs: f64,
    pub hold_max_secs: f64,
    pub intensity_min: u8,
    pub intensity_max: u8,
}

impl DifficultyPreset {
    pub fn easy() -> Self {
        Self {
            min_spacing_secs: 1.5,
            beat_min_secs: 1.2,
            beat_max_secs: 2.0,
            chord_probability: 0.0,
            hold_probability: 0.15,
            hold_min_secs: 0.4,
            hold_max_secs: 0.8,
            intensity_min: 30,
            intensity_max: 70,
        }
    }

    pub fn medium() -> Self {
        Self {
            min_spacing_secs: 1.0,
            beat_min_secs: 0.8,
            beat_max_secs: 1.4,
            chord_probability: 0.15,
            hold_probability: 0.25,
            hold_min_secs: 0.4,
            hold_max_secs: 1.2,
            intensity_min: 20,
            intensity_max: 90,
        }
    }

    pub fn hard() -> Self {
        Self {
            min_spacing_secs: 0.6,
            beat_min_secs: 0.5,
            beat_max_secs: 1.0,
            chord_probability: 0.3,
            hold_probability: 0.35,
            hold_min_secs: 0.3,
            hold_max_secs: 1.5,
            intensity_min: 10,
            intensity_max: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_lanes")]
    pub lanes: Vec<Lane>,
    /// Quiet time before the first beat.
    #[serde(default = "default_lead_in_secs")]
    pub lead_in_secs: f64,
    #[serde(default = "DifficultyPreset::easy")]
    pub easy: DifficultyPreset,
    #[serde(default = "DifficultyPreset::medium")]
    pub medium: DifficultyPreset,
    #[serde(default = "DifficultyPreset::hard")]
    pub hard: DifficultyPreset,
}

fn default_lanes() -> Vec<Lane> {
    vec![Lane::Accelerator, Lane::Brake]
}
fn default_lead_in_secs() -> f64 {
    2.0
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            lead_in_secs: default_lead_in_secs(),
            easy: DifficultyPreset::easy(),
            medium: DifficultyPreset::medium(),
            hard: DifficultyPreset::hard(),
        }
    }
}

impl GeneratorConfig {
    pub fn preset(&self, difficulty: Difficulty) -> &DifficultyPreset {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }
}

/// Output of [`TargetGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedExercise {
    /// Sorted by time, then lane. Ids run from 1.
    pub targets: Vec<Target>,
    /// Session length in seconds.
    pub end_secs: f64,
    /// Seed actually used; `None` for pre-built definitions.
    pub seed: Option<u64>,
}

pub struct TargetGenerator {
    config: GeneratorConfig,
    table: ToleranceTable,
}

impl TargetGenerator {
    pub fn new(config: GeneratorConfig, table: ToleranceTable) -> Self {
        Self { config, table }
    }

    /// Expand a definition into targets.
    ///
    /// `seed` only matters for random definitions; `None` draws one from
    /// entropy and reports it in the result.
    ///
    /// # Errors
    ///
    /// Any [`ExerciseError`] from validation, or `Empty` when a random
    /// definition is too short to hold a single target.
    pub fn generate(
        &self,
        definition: &ExerciseDefinition,
        seed: Option<u64>,
    ) -> Result<GeneratedExercise, ExerciseError> {
        match definition {
            ExerciseDefinition::Random {
                difficulty,
                duration,
            } => {
                let seed = seed.unwrap_or_else(rand::random);
                let targets = self.generate_random(*difficulty, *duration, seed)?;
                debug!(
                    ?difficulty,
                    duration,
                    seed,
                    count = targets.len(),
                    "generated random exercise"
                );
                Ok(GeneratedExercise {
                    targets,
                    end_secs: *duration,
                    seed: Some(seed),
                })
            }
            ExerciseDefinition::FileBacked { targets, duration }
            | ExerciseDefinition::PreLoaded { targets, duration } => {
                validate_targets(targets, *duration, &self.table)?;
                let mut targets = targets.clone();
                targets.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.lane.cmp(&b.lane)));
                let last_close = targets
                    .iter()
                    .map(|t| window_close(t, &self.table))
                    .fold(0.0, f64::max);
                Ok(GeneratedExercise {
                    end_secs: duration.unwrap_or(last_close),
                    targets,
                    seed: None,
                })
            }
        }
    }

    fn generate_random(
        &self,
        difficulty: Difficulty,
        duration: f64,
        seed: u64,
    ) -> Result<Vec<Target>, ExerciseError> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ExerciseError::NonPositiveDuration(duration));
        }
        if self.config.lanes.is_empty() {
            return Err(ExerciseError::Malformed("no lanes configured".into()));
        }

        let preset = self.config.preset(difficulty);
        let mut rng = Mcg128Xsl64::seed_from_u64(seed);

        let late = self.table.widest_late();
        let span = self.table.widest_early() + late;
        let chord_p = preset.chord_probability.clamp(0.0, 1.0);
        let hold_p = preset.hold_probability.clamp(0.0, 1.0);
        let (i_lo, i_hi) = ordered(preset.intensity_min.min(100), preset.intensity_max.min(100));

        let mut lanes = self.config.lanes.clone();
        lanes.sort();
        lanes.dedup();

        let mut next_free: HashMap<Lane, f64> = HashMap::new();
        let mut targets = Vec::new();
        let mut t = round_ms(self.config.lead_in_secs.max(0.0).min(duration * 0.25));

        while t <= duration {
            lanes.shuffle(&mut rng);
            let free: Vec<Lane> = lanes
                .iter()
                .copied()
                .filter(|lane| next_free.get(lane).map_or(true, |&at| t >= at))
                .collect();

            if let Some((first, rest)) = free.split_first() {
                let mut voices = vec![*first];
                voices.extend(rest.iter().copied().filter(|_| rng.gen_bool(chord_p)));

                for lane in voices {
                    let mut hold = if rng.gen_bool(hold_p) {
                        round_ms(uniform(&mut rng, preset.hold_min_secs, preset.hold_max_secs))
                    } else {
                        0.0
                    };
                    if t + hold + late > duration {
                        hold = 0.0;
                    }
                    if t + late > duration {
                        continue;
                    }
                    let intensity = rng.gen_range(i_lo..=i_hi);
                    targets.push(Target {
                        id: 0,
                        time: t,
                        lane,
                        intensity,
                        hold_duration: (hold > 0.0).then_some(hold),
                    });
                    let clearance = hold + span + WINDOW_SEPARATION_SECS;
                    next_free.insert(lane, t + preset.min_spacing_secs.max(clearance));
                }
            }

            t = round_ms(t + uniform(&mut rng, preset.beat_min_secs, preset.beat_max_secs).max(0.001));
        }

        if targets.is_empty() {
            return Err(ExerciseError::Empty);
        }

        targets.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.lane.cmp(&b.lane)));
        for (idx, target) in targets.iter_mut().enumerate() {
            target.id = idx as u32 + 1;
        }
        validate_targets(&targets, Some(duration), &self.table)?;
        Ok(targets)
    }
}

fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

fn ordered<T: PartialOrd>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn uniform(rng: &mut Mcg128Xsl64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = ordered(lo.max(0.0), hi.max(0.0));
    if hi - lo < f64::EPSILON {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}
