use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use pedaldrill_core::Config;
use tracing::info;

/// Top-level tables of `config.toml`.
#[derive(Clone, Copy, ValueEnum)]
pub enum Section {
    Judge,
    Scoring,
    Countdown,
    Transport,
    Generator,
}

impl Section {
    fn key(self) -> &'static str {
        match self {
            Section::Judge => "judge",
            Section::Scoring => "scoring",
            Section::Countdown => "countdown",
            Section::Transport => "transport",
            Section::Generator => "generator",
        }
    }

    fn reset(self, config: &mut Config) {
        match self {
            Section::Judge => config.judge = Default::default(),
            Section::Scoring => config.scoring = Default::default(),
            Section::Countdown => config.countdown = Default::default(),
            Section::Transport => config.transport = Default::default(),
            Section::Generator => config.generator = Default::default(),
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print where the config file lives
    Path,
    /// Print the config, or one section of it, as JSON
    Show {
        #[arg(value_enum)]
        section: Option<Section>,
    },
    /// Get a single value by dot path (e.g. "judge.tolerance.tiers.0.early_secs")
    Get { key: String },
    /// Set a value; the whole config is re-validated before saving
    Set {
        key: String,
        /// New value (JSON for lists and tables)
        value: String,
    },
    /// Check a config file without changing it
    Validate {
        /// Defaults to the active config file
        file: Option<PathBuf>,
    },
    /// Restore defaults for one section or the whole file
    Reset {
        #[arg(value_enum)]
        section: Option<Section>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Path => println!("{}", Config::file_path()?.display()),
        ConfigAction::Show { section } => {
            let config = serde_json::to_value(Config::load()?)?;
            let shown = match section {
                Some(section) => config
                    .get(section.key())
                    .cloned()
                    .ok_or_else(|| format!("missing section: {}", section.key()))?,
                None => config,
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        ConfigAction::Get { key } => match Config::load()?.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            info!(key = %key, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::Validate { file } => {
            let path = match file {
                Some(path) => path,
                None => Config::file_path()?,
            };
            Config::load_from(&path)?;
            println!("{}: ok", path.display());
        }
        ConfigAction::Reset { section } => {
            let config = match section {
                Some(section) => {
                    let mut config = Config::load()?;
                    section.reset(&mut config);
                    config
                }
                None => Config::default(),
            };
            config.save()?;
            match section {
                Some(section) => println!("[{}] reset to defaults", section.key()),
                None => println!("config reset to defaults"),
            }
        }
    }
    Ok(())
}
