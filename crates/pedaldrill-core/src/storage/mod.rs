mod config;

pub use config::Config;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/pedaldrill[-dev]/` based on PEDALDRILL_ENV.
///
/// Set PEDALDRILL_ENV=dev to use the development directory, or
/// PEDALDRILL_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("PEDALDRILL_CONFIG_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("PEDALDRILL_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("pedaldrill-dev")
            } else {
                base_dir.join("pedaldrill")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
