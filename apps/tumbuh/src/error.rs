//! # Application Errors

use thiserror::Error;
use tumbuh_core::GrowthError;

/// Errors surfaced by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failure inside the classification engine.
    #[error(transparent)]
    Growth(#[from] GrowthError),

    /// The configuration file could not be read or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}
