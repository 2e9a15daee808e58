//! Runtime configuration: built-in defaults, then `DECKWISE_*` environment
//! variables, then command-line flags.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const CARDS_ENV: &str = "DECKWISE_CARDS";
pub const DATA_DIR_ENV: &str = "DECKWISE_DATA_DIR";
pub const LOG_ENV: &str = "DECKWISE_LOG";

const DEFAULT_CARDS_PATH: &str = "cards.json";
const DEFAULT_DATA_DIR: &str = ".deckwise";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),
    #[error("environment variable {0} is set but empty")]
    EmptyVariable(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Scryfall bulk-data JSON.
    pub cards_path: PathBuf,
    /// Where decks and the collection are saved.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cards_path: PathBuf::from(DEFAULT_CARDS_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env(|name| env::var(name).ok())
    }

    /// Overlays variables read through `var`.
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(value) = var(CARDS_ENV) {
            self.cards_path = non_empty(CARDS_ENV, value)?.into();
        }
        if let Some(value) = var(DATA_DIR_ENV) {
            self.data_dir = non_empty(DATA_DIR_ENV, value)?.into();
        }
        Ok(self)
    }

    /// Takes `--cards PATH` and `--data-dir DIR` out of `args`, wherever
    /// they appear, and returns the remaining arguments in order.
    pub fn with_args(mut self, args: Vec<String>) -> Result<(Self, Vec<String>), ConfigError> {
        let mut rest = Vec::with_capacity(args.len());
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--cards" => {
                    let value = iter.next().ok_or(ConfigError::MissingValue(arg))?;
                    self.cards_path = value.into();
                }
                "--data-dir" => {
                    let value = iter.next().ok_or(ConfigError::MissingValue(arg))?;
                    self.data_dir = value.into();
                }
                _ => rest.push(arg),
            }
        }
        Ok((self, rest))
    }
}

fn non_empty(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::EmptyVariable(name))
    } else {
        Ok(value)
    }
}

/// The `env_logger` filter: `DECKWISE_LOG`, else `RUST_LOG`, else `warn`.
pub fn log_filter() -> String {
    env::var(LOG_ENV)
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string())
}
