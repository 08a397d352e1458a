//! # Configuration
//!
//! TOML configuration for the CLI.
//!
//! ## Resolution Order
//!
//! 1. `--config <path>`
//! 2. `TUMBUH_CONFIG` environment variable
//! 3. Built-in defaults
//!
//! Every key is optional; missing keys take their default. Command-line
//! flags override values from the file.
//!
//! ```toml
//! reference_dir = "reference"
//! policy = "lms"
//! age_policy = "calendar"
//! result_log = "results.csv"
//!
//! [bounds]
//! height_min_cm = 50.0
//!
//! [overall]
//! borderline_upper = -1.0
//! borderline_inclusive = false
//!
//! [lookup]
//! max_distance_months = 6
//!
//! [lms]
//! weight_tail_adjustment = true
//!
//! [[height_thresholds]]
//! age_lower_bound = 0
//! threshold_cm = 110.0
//! ```

use crate::CliError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tumbuh_core::{
    AgePolicy, BorderlineBand, ClassificationPolicy, EvaluationOptions, GrowthError,
    HeightThreshold, HeightThresholdTable, MeasurementBounds, MedianSd, MedianSdTable,
};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TUMBUH_CONFIG";

/// Default directory holding the `{hfa,wfa}_{male,female}.csv` tables.
pub const DEFAULT_REFERENCE_DIR: &str = "reference";

// =============================================================================
// SECTIONS
// =============================================================================

/// `[overall]`: composite status tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverallConfig {
    pub borderline_upper: f64,
    pub borderline_inclusive: bool,
}

impl Default for OverallConfig {
    fn default() -> Self {
        let band = BorderlineBand::default();
        Self {
            borderline_upper: band.upper,
            borderline_inclusive: band.upper_inclusive,
        }
    }
}

/// `[lookup]`: reference row resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LookupConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance_months: Option<u32>,
}

/// `[lms]`: LMS transform options.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LmsConfig {
    pub weight_tail_adjustment: bool,
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Effective application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub reference_dir: PathBuf,
    pub policy: ClassificationPolicy,
    pub age_policy: AgePolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_log: Option<PathBuf>,
    pub bounds: MeasurementBounds,
    pub overall: OverallConfig,
    pub lookup: LookupConfig,
    pub lms: LmsConfig,
    pub height_thresholds: Vec<HeightThreshold>,
    pub median_sd: Vec<MedianSd>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from(DEFAULT_REFERENCE_DIR),
            policy: ClassificationPolicy::default(),
            age_policy: AgePolicy::default(),
            result_log: None,
            bounds: MeasurementBounds::default(),
            overall: OverallConfig::default(),
            lookup: LookupConfig::default(),
            lms: LmsConfig::default(),
            height_thresholds: HeightThresholdTable::default().bands().to_vec(),
            median_sd: MedianSdTable::default().rows().to_vec(),
        }
    }
}

impl AppConfig {
    /// Resolve and load the configuration.
    ///
    /// `explicit` wins over `TUMBUH_CONFIG`; with neither, defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a configuration file.
    pub fn load_from(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, CliError> {
        let config: Self = toml::from_str(text).map_err(|e| CliError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, CliError> {
        toml::to_string(self).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Check that every section can actually be used.
    pub fn validate(&self) -> Result<(), CliError> {
        self.bounds.validate()?;
        if !self.overall.borderline_upper.is_finite() || self.overall.borderline_upper < -2.0 {
            return Err(CliError::Config(format!(
                "overall.borderline_upper must be >= -2, got {}",
                self.overall.borderline_upper
            )));
        }
        self.height_threshold_table()?;
        self.median_sd_table()?;
        Ok(())
    }

    /// Evaluation options derived from the file.
    #[must_use]
    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            age_policy: self.age_policy,
            bounds: self.bounds,
            borderline: BorderlineBand {
                upper: self.overall.borderline_upper,
                upper_inclusive: self.overall.borderline_inclusive,
            },
            max_lookup_distance: self.lookup.max_distance_months,
            weight_tail_adjustment: self.lms.weight_tail_adjustment,
        }
    }

    /// Height thresholds for the `height-threshold` policy.
    pub fn height_threshold_table(&self) -> Result<HeightThresholdTable, GrowthError> {
        HeightThresholdTable::new(self.height_thresholds.clone())
    }

    /// Median/SD rows for the `median-sd` policy.
    pub fn median_sd_table(&self) -> Result<MedianSdTable, GrowthError> {
        MedianSdTable::new(self.median_sd.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================
