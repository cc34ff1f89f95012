//! User configuration, read from `<config dir>/pgsh/config.toml`. A missing
//! or unreadable file falls back to defaults; pgsh never writes the file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Number of lines kept in the reedline history file.
    pub history_size: usize,
    /// Print the greeting line on startup.
    pub show_banner: bool,
    /// Start with expanded (vertical) result display.
    pub expanded_display_default: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_size: 1000,
            show_banner: true,
            expanded_display_default: false,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pgsh"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: ignoring malformed config {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.history_size, 1000);
        assert!(config.show_banner);
        assert!(!config.expanded_display_default);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config: Config = toml::from_str("history_size = 50").unwrap();
        assert_eq!(config.history_size, 50);
        assert!(config.show_banner);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            history_size: 250,
            show_banner: false,
            expanded_display_default: true,
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.history_size, 250);
        assert!(!parsed.show_banner);
        assert!(parsed.expanded_display_default);
    }
}
