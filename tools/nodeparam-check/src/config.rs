//! Configuration for nodeparam-check.

use anyhow::{bail, Result};

use crate::output::OutputFormat;

/// Settings read from the environment; command-line flags take precedence.
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format used when `--format` is not given.
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let log_level = std::env::var("NODEPARAM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let format = match std::env::var("NODEPARAM_FORMAT") {
            Ok(raw) => match raw.parse() {
                Ok(format) => format,
                Err(_) => bail!("NODEPARAM_FORMAT must be 'table' or 'json', got '{raw}'"),
            },
            Err(_) => OutputFormat::default(),
        };

        Ok(Self { log_level, format })
    }
}
