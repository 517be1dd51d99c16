//! Configuration handling for otto
//!
//! otto reads its own settings from the environment only; the command
//! line is reserved for `--ottofile` and the task stream.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `OTTO_YML` | Ottofile to use when `--ottofile` is not given |
//! | `OTTO_FORMAT` | `text` (default) or `json` result output |
//! | `OTTO_VERBOSE` | `1`, `true` or `yes` enables diagnostics on stderr |

use clap::ValueEnum;
use thiserror::Error;

/// Environment variable bound to `--ottofile`
pub const OTTOFILE_ENV: &str = "OTTO_YML";

/// Environment variable selecting the output format
pub const FORMAT_ENV: &str = "OTTO_FORMAT";

/// Environment variable enabling verbose output
pub const VERBOSE_ENV: &str = "OTTO_VERBOSE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Runtime settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub format: OutputFormat,
    pub verbose: bool,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let format = match lookup(FORMAT_ENV).filter(|v| !v.trim().is_empty()) {
            Some(value) => OutputFormat::from_str(value.trim(), true).map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be 'text' or 'json', got '{}'",
                    FORMAT_ENV, value
                ))
            })?,
            None => OutputFormat::default(),
        };

        let verbose = lookup(VERBOSE_ENV)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self { format, verbose })
    }
}
