use std::path::PathBuf;

use clap::Subcommand;
use pedaldrill_core::{
    run_script, Config, Difficulty, DrillSession, ExerciseDefinition, ExerciseInput,
    ExerciseSource, FileSystemSource, InputScript, TargetGenerator, TracingSink,
};
use serde::Serialize;

#[derive(Subcommand)]
pub enum DrillAction {
    /// Generate a random exercise and print its targets as JSON
    Generate {
        /// easy, medium or hard
        #[arg(long, default_value = "easy")]
        difficulty: Difficulty,
        /// Length in seconds
        #[arg(long, default_value = "30")]
        duration: f64,
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Check an exercise request without running it
    Validate {
        /// Request JSON, e.g. '{"file": "warmup.json"}'
        request: String,
        /// Directory that file handles resolve against
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Run an exercise headless with scripted input and print the report
    Run {
        /// Request JSON, e.g. '{"type": "random", "difficulty": "hard", "duration": 20}'
        request: String,
        /// Directory that file handles resolve against
        #[arg(long, default_value = ".")]
        root: PathBuf,
        #[arg(long)]
        seed: Option<u64>,
        /// Input script JSON file
        #[arg(long, conflicts_with = "autoplay")]
        script: Option<PathBuf>,
        /// Press every target this many seconds off its time
        #[arg(long, allow_hyphen_values = true)]
        autoplay: Option<f64>,
        /// Tick rate; defaults to transport.tick_hz from the config
        #[arg(long)]
        tick_hz: Option<u32>,
        /// Include the full event log
        #[arg(long)]
        events: bool,
    },
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    kind: &'a str,
    targets: usize,
    end_secs: f64,
}

fn load_definition(
    config: &Config,
    request: &str,
    root: PathBuf,
) -> Result<ExerciseDefinition, Box<dyn std::error::Error>> {
    let input = ExerciseInput::from_json_str(request)?;
    let source = FileSystemSource::new(root, config.judge.tolerance.clone());
    Ok(source.load(&input)?)
}

fn generator(config: &Config) -> TargetGenerator {
    TargetGenerator::new(config.generator.clone(), config.judge.tolerance.clone())
}

pub fn run(action: DrillAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    match action {
        DrillAction::Generate {
            difficulty,
            duration,
            seed,
        } => {
            let def = ExerciseDefinition::Random {
                difficulty,
                duration,
            };
            let generated = generator(&config).generate(&def, seed)?;
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
        DrillAction::Validate { request, root } => {
            let def = load_definition(&config, &request, root)?;
            let generated = generator(&config).generate(&def, None)?;
            let report = ValidationReport {
                kind: def.kind_str(),
                targets: generated.targets.len(),
                end_secs: generated.end_secs,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        DrillAction::Run {
            request,
            root,
            seed,
            script,
            autoplay,
            tick_hz,
            events,
        } => {
            let def = load_definition(&config, &request, root)?;
            // Fix the seed up front so autoplay sees the same targets the session will.
            let generated = generator(&config).generate(&def, seed)?;
            let script = match (script, autoplay) {
                (Some(path), _) => InputScript::load(&path)?,
                (None, Some(offset)) => InputScript::autoplay(&generated.targets, offset),
                (None, None) => InputScript::new(),
            };

            let mut session = DrillSession::with_sink(config.settings(), Box::new(TracingSink));
            let tick_hz = tick_hz.unwrap_or(config.transport.tick_hz);
            let mut report = run_script(&mut session, &def, generated.seed, &script, tick_hz)?;
            if !events {
                report.events.clear();
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
