//! Runtime settings.
//!
//! Settings come from an optional TOML file, then environment variables,
//! then command-line flags, each layer overriding the previous one. A
//! running session can also change some of them through `setoption`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File read when no explicit config path is given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "boardrefs.toml";

/// Errors that can occur while loading or updating settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

/// Session settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Highlight color used when a highlight command names none.
    pub highlight_color: String,
    /// Position loaded at startup instead of the standard arrangement.
    pub start_fen: Option<String>,
    /// Seed for random move selection; entropy when unset.
    pub seed: Option<u64>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            highlight_color: "yellow".to_string(),
            start_fen: None,
            seed: None,
            log_filter: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Settings, toml::de::Error> {
        toml::from_str(s)
    }

    /// Overrides fields from `BOARDREFS_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overrides fields from an arbitrary variable lookup.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BOARDREFS_HIGHLIGHT_COLOR") {
            self.highlight_color = v;
        }
        if let Some(v) = lookup("BOARDREFS_START_FEN") {
            self.start_fen = Some(v);
        }
        if let Some(v) = lookup("BOARDREFS_SEED") {
            self.seed = Some(parse_seed("BOARDREFS_SEED", &v)?);
        }
        if let Some(v) = lookup("BOARDREFS_LOG") {
            self.log_filter = v;
        }
        Ok(())
    }

    /// Applies a `setoption name <id> [value <x>]` update.
    ///
    /// A missing value resets the option to its default.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "highlightcolor" => {
                self.highlight_color = match value {
                    Some(v) => v.to_string(),
                    None => Settings::default().highlight_color,
                };
            }
            "seed" => {
                self.seed = value.map(|v| parse_seed(name, v)).transpose()?;
            }
            "startfen" => {
                self.start_fen = value.map(str::to_string);
            }
            _ => return Err(ConfigError::UnknownOption(name.to_string())),
        }
        Ok(())
    }
}

fn parse_seed(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// Loads settings from `path`, or from `DEFAULT_CONFIG_FILE` when it exists,
/// then applies environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = match path {
        Some(p) => read_file(p)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };
    settings.apply_env()?;
    Ok(settings)
}

fn read_file(path: &Path) -> Result<Settings, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
