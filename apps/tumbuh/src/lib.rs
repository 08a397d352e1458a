//! # Tumbuh - Child Growth Screening
//!
//! Library half of the `tumbuh` binary: the CLI definition, configuration
//! loading and the application error type. The classification itself lives
//! in `tumbuh-core`.

pub mod cli;
pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::CliError;
