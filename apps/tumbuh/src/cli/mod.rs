//! # Tumbuh CLI Module
//!
//! This module implements the CLI interface for Tumbuh.
//!
//! ## Available Commands
//!
//! - `evaluate` - Classify one child and optionally log the result
//! - `age` - Compute age between two dates
//! - `zscore` - Compute one LMS Z-score against the reference tables
//! - `tables` - Show the loaded reference data
//! - `recap` - Summarize a result log per school class
//! - `config` - Show the effective configuration

mod commands;

use crate::{AppConfig, CliError};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tumbuh_core::{AgePolicy, ClassificationPolicy, Indicator, Sex};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Tumbuh - Child Growth Screening
///
/// Classifies stunting and weight status of primary school children from
/// height, weight, age and sex against WHO-style reference tables.
#[derive(Parser, Debug)]
#[command(name = "tumbuh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file (overrides TUMBUH_CONFIG)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify one child
    Evaluate {
        /// Child's name (free text)
        #[arg(short, long, default_value = "")]
        name: String,

        /// Sex: male/female (also L/P, laki-laki/perempuan)
        #[arg(short, long)]
        sex: Sex,

        /// Birth date (YYYY-MM-DD)
        #[arg(short, long)]
        birth_date: NaiveDate,

        /// Height in cm
        #[arg(short = 'H', long)]
        height: f64,

        /// Weight in kg
        #[arg(short = 'W', long)]
        weight: f64,

        /// School class (1-6)
        #[arg(long)]
        class: Option<u8>,

        /// Evaluation date (defaults to today)
        #[arg(short, long)]
        today: Option<NaiveDate>,

        /// Classification policy (lms, height-threshold, median-sd)
        #[arg(short, long)]
        policy: Option<ClassificationPolicy>,

        /// Age arithmetic (calendar, day-count)
        #[arg(short, long)]
        age_policy: Option<AgePolicy>,

        /// Directory with the reference CSV tables
        #[arg(short, long)]
        reference_dir: Option<PathBuf>,

        /// Append the result to this CSV log
        #[arg(short, long)]
        log: Option<PathBuf>,
    },

    /// Compute age between a birth date and a reference date
    Age {
        /// Birth date (YYYY-MM-DD)
        #[arg(short, long)]
        birth_date: NaiveDate,

        /// Reference date (defaults to today)
        #[arg(short, long)]
        today: Option<NaiveDate>,

        /// Age arithmetic (calendar, day-count)
        #[arg(short, long)]
        age_policy: Option<AgePolicy>,
    },

    /// Compute one LMS Z-score
    Zscore {
        /// Sex: male/female
        #[arg(short, long)]
        sex: Sex,

        /// Indicator (hfa, wfa)
        #[arg(short, long)]
        indicator: Indicator,

        /// Age in whole months
        #[arg(short, long)]
        months: u32,

        /// Measurement (cm for hfa, kg for wfa)
        #[arg(short = 'x', long)]
        value: f64,

        /// Directory with the reference CSV tables
        #[arg(short, long)]
        reference_dir: Option<PathBuf>,
    },

    /// Show loaded reference tables and simplified-policy tables
    Tables {
        /// Directory with the reference CSV tables
        #[arg(short, long)]
        reference_dir: Option<PathBuf>,
    },

    /// Count logged results per school class and status
    Recap {
        /// CSV log to read (defaults to result_log from the configuration)
        #[arg(short, long)]
        log: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Evaluate {
            name,
            sex,
            birth_date,
            height,
            weight,
            class,
            today,
            policy,
            age_policy,
            reference_dir,
            log,
        }) => {
            let request = EvaluateRequest {
                name,
                sex,
                birth_date,
                height_cm: height,
                weight_kg: weight,
                school_class: class,
                today: today.unwrap_or_else(today_local),
                policy,
                age_policy,
                reference_dir,
                log,
            };
            cmd_evaluate(&config, json_mode, &request)
        }
        Some(Commands::Age {
            birth_date,
            today,
            age_policy,
        }) => cmd_age(
            &config,
            json_mode,
            birth_date,
            today.unwrap_or_else(today_local),
            age_policy,
        ),
        Some(Commands::Zscore {
            sex,
            indicator,
            months,
            value,
            reference_dir,
        }) => cmd_zscore(
            &config,
            json_mode,
            sex,
            indicator,
            months,
            value,
            reference_dir.as_deref(),
        ),
        Some(Commands::Tables { reference_dir }) => {
            cmd_tables(&config, json_mode, reference_dir.as_deref())
        }
        Some(Commands::Recap { log }) => cmd_recap(&config, json_mode, log.as_deref()),
        Some(Commands::Config) => cmd_config(&config, json_mode),
        None => {
            // No subcommand - show the effective configuration
            cmd_config(&config, json_mode)
        }
    }
}

/// Today's date in the local time zone.
fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}
