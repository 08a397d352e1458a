//! # Status Classifier
//!
//! Maps Z-scores (or raw height, for the simplified policies) to
//! categorical nutritional-status labels.
//!
//! ## Bands
//!
//! Every band is half-open with an inclusive lower bound (`z < t`, never
//! `z <= t`), except the upper edges of the weight-for-age `Normal` and
//! `OverweightRisk` bands, which are inclusive.
//!
//! | Indicator | Condition | Status |
//! |-----------|-----------|--------|
//! | HFA | z < -3 | `SevereStunting` |
//! | HFA | -3 <= z < -2 | `Stunting` |
//! | HFA | z >= -2 | `Normal` |
//! | WFA | z < -3 | `SeverelyUnderweight` |
//! | WFA | -3 <= z < -2 | `Underweight` |
//! | WFA | -2 <= z <= 1 | `Normal` |
//! | WFA | 1 < z <= 2 | `OverweightRisk` |
//! | WFA | z > 2 | `ObesityRisk` |

use crate::GrowthError;
use crate::primitives::{DEFAULT_BORDERLINE_UPPER, Z_MODERATE, Z_OBESE, Z_OVERWEIGHT, Z_SEVERE};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// HEIGHT-FOR-AGE
// =============================================================================

/// Height-for-age status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightStatus {
    SevereStunting,
    Stunting,
    Normal,
}

impl HeightStatus {
    /// Display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            HeightStatus::SevereStunting => "Stunting Berat",
            HeightStatus::Stunting => "Stunting",
            HeightStatus::Normal => "Normal",
        }
    }

    /// True for `SevereStunting` and `Stunting`.
    #[must_use]
    pub fn is_stunted(&self) -> bool {
        matches!(self, HeightStatus::SevereStunting | HeightStatus::Stunting)
    }
}

impl fmt::Display for HeightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a height-for-age Z-score.
#[must_use]
pub fn classify_height_for_age(z: f64) -> HeightStatus {
    if z < Z_SEVERE {
        HeightStatus::SevereStunting
    } else if z < Z_MODERATE {
        HeightStatus::Stunting
    } else {
        HeightStatus::Normal
    }
}

// =============================================================================
// WEIGHT-FOR-AGE
// =============================================================================

/// Weight-for-age status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStatus {
    SeverelyUnderweight,
    Underweight,
    Normal,
    OverweightRisk,
    ObesityRisk,
}

impl WeightStatus {
    /// Display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            WeightStatus::SeverelyUnderweight => "Severely underweight",
            WeightStatus::Underweight => "Underweight",
            WeightStatus::Normal => "Normal",
            WeightStatus::OverweightRisk => "Overweight risk",
            WeightStatus::ObesityRisk => "Obesity risk",
        }
    }
}

impl fmt::Display for WeightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a weight-for-age Z-score.
#[must_use]
pub fn classify_weight_for_age(z: f64) -> WeightStatus {
    if z < Z_SEVERE {
        WeightStatus::SeverelyUnderweight
    } else if z < Z_MODERATE {
        WeightStatus::Underweight
    } else if z <= Z_OVERWEIGHT {
        WeightStatus::Normal
    } else if z <= Z_OBESE {
        WeightStatus::OverweightRisk
    } else {
        WeightStatus::ObesityRisk
    }
}

// =============================================================================
// SIMPLIFIED POLICY: HEIGHT THRESHOLDS
// =============================================================================

/// One band of the raw height threshold table: from `age_lower_bound`
/// whole years onward, heights below `threshold_cm` count as stunting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeightThreshold {
    pub age_lower_bound: u32,
    pub threshold_cm: f64,
}

/// Age-bucketed raw height thresholds, sorted by `age_lower_bound`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeightThresholdTable {
    bands: Vec<HeightThreshold>,
}

impl Default for HeightThresholdTable {
    /// 110 cm below age 5, 115 cm for ages 5-7, then 120/130/140 cm.
    fn default() -> Self {
        let bands = [(0, 110.0), (5, 115.0), (8, 120.0), (10, 130.0), (12, 140.0)]
            .into_iter()
            .map(|(age_lower_bound, threshold_cm)| HeightThreshold {
                age_lower_bound,
                threshold_cm,
            })
            .collect();
        Self { bands }
    }
}

impl HeightThresholdTable {
    /// Build a table from bands in any order.
    ///
    /// # Errors
    /// - `ReferenceDataMissing` if `bands` is empty
    /// - `InvalidInput` for duplicate lower bounds or non-positive thresholds
    pub fn new(mut bands: Vec<HeightThreshold>) -> Result<Self, GrowthError> {
        if bands.is_empty() {
            return Err(GrowthError::ReferenceDataMissing(
                "height threshold table has no bands".to_string(),
            ));
        }
        if let Some(bad) = bands
            .iter()
            .find(|b| !b.threshold_cm.is_finite() || b.threshold_cm <= 0.0)
        {
            return Err(GrowthError::InvalidInput(format!(
                "height threshold for age {} must be positive",
                bad.age_lower_bound
            )));
        }
        bands.sort_by_key(|b| b.age_lower_bound);
        if bands
            .windows(2)
            .any(|w| w[0].age_lower_bound == w[1].age_lower_bound)
        {
            return Err(GrowthError::InvalidInput(
                "duplicate age lower bound in height threshold table".to_string(),
            ));
        }
        Ok(Self { bands })
    }

    /// Bands in ascending age order.
    #[must_use]
    pub fn bands(&self) -> &[HeightThreshold] {
        &self.bands
    }

    /// Threshold applying at `age_years`: the band with the greatest lower
    /// bound not above the age. Ages below the first band use the first band.
    #[must_use]
    pub fn threshold_for(&self, age_years: u32) -> f64 {
        self.bands
            .iter()
            .rev()
            .find(|b| b.age_lower_bound <= age_years)
            .or_else(|| self.bands.first())
            .map_or(0.0, |b| b.threshold_cm)
    }

    /// Binary classification: `Stunting` strictly below the threshold,
    /// `Normal` otherwise.
    #[must_use]
    pub fn classify(&self, age_years: u32, height_cm: f64) -> HeightStatus {
        if height_cm < self.threshold_for(age_years) {
            HeightStatus::Stunting
        } else {
            HeightStatus::Normal
        }
    }
}

// =============================================================================
// SIMPLIFIED POLICY: MEDIAN / SD PER YEAR
// =============================================================================

/// Median and standard deviation of height at one whole year of age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedianSd {
    pub age_years: u32,
    pub median_cm: f64,
    pub sd_cm: f64,
}

/// Small per-year height table: `z = (height - median) / sd`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedianSdTable {
    rows: Vec<MedianSd>,
}

impl Default for MedianSdTable {
    /// Primary school ages 6-12.
    fn default() -> Self {
        let rows = [
            (6, 116.0, 5.0),
            (7, 122.0, 5.3),
            (8, 128.0, 5.6),
            (9, 133.0, 6.0),
            (10, 138.0, 6.3),
            (11, 144.0, 6.8),
            (12, 150.0, 7.3),
        ]
        .into_iter()
        .map(|(age_years, median_cm, sd_cm)| MedianSd {
            age_years,
            median_cm,
            sd_cm,
        })
        .collect();
        Self { rows }
    }
}

impl MedianSdTable {
    /// Build a table from rows in any order.
    ///
    /// # Errors
    /// - `ReferenceDataMissing` if `rows` is empty
    /// - `InvalidInput` for duplicate ages or non-positive median / SD
    pub fn new(mut rows: Vec<MedianSd>) -> Result<Self, GrowthError> {
        if rows.is_empty() {
            return Err(GrowthError::ReferenceDataMissing(
                "median/SD table has no rows".to_string(),
            ));
        }
        if let Some(bad) = rows.iter().find(|r| {
            !(r.median_cm.is_finite() && r.sd_cm.is_finite()) || r.median_cm <= 0.0 || r.sd_cm <= 0.0
        }) {
            return Err(GrowthError::InvalidInput(format!(
                "median and SD must be positive at age {}",
                bad.age_years
            )));
        }
        rows.sort_by_key(|r| r.age_years);
        if rows.windows(2).any(|w| w[0].age_years == w[1].age_years) {
            return Err(GrowthError::InvalidInput(
                "duplicate age in median/SD table".to_string(),
            ));
        }
        Ok(Self { rows })
    }

    /// Rows in ascending age order.
    #[must_use]
    pub fn rows(&self) -> &[MedianSd] {
        &self.rows
    }

    /// Row for `age_years`: exact match, else nearest age (ties go lower).
    pub fn row_for(&self, age_years: u32) -> Result<&MedianSd, GrowthError> {
        self.rows
            .iter()
            .min_by_key(|r| (r.age_years.abs_diff(age_years), r.age_years))
            .ok_or_else(|| GrowthError::ReferenceDataMissing("median/SD table is empty".to_string()))
    }

    /// Height Z-score at `age_years`.
    pub fn z_score(&self, age_years: u32, height_cm: f64) -> Result<f64, GrowthError> {
        if !height_cm.is_finite() || height_cm <= 0.0 {
            return Err(GrowthError::InvalidInput(format!(
                "height must be positive, got {}",
                height_cm
            )));
        }
        let row = self.row_for(age_years)?;
        Ok((height_cm - row.median_cm) / row.sd_cm)
    }
}

// =============================================================================
// OVERALL STATUS
// =============================================================================

/// Headline status combining both indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    StuntingAlert,
    NeedsAttention,
    OverweightRisk,
    Healthy,
    IncompleteData,
}

impl OverallStatus {
    /// Display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::StuntingAlert => "Stunting alert",
            OverallStatus::NeedsAttention => "Needs attention",
            OverallStatus::OverweightRisk => "Overweight risk",
            OverallStatus::Healthy => "Healthy, growing well",
            OverallStatus::IncompleteData => "Incomplete data",
        }
    }

    /// Colour name a display layer may use for this status.
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            OverallStatus::StuntingAlert => "red",
            OverallStatus::NeedsAttention => "orange",
            OverallStatus::OverweightRisk => "purple",
            OverallStatus::Healthy => "green",
            OverallStatus::IncompleteData => "gray",
        }
    }

    /// Static advice shown with the result.
    #[must_use]
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            OverallStatus::StuntingAlert => Some(
                "Consult the community health centre soon and improve the diet with balanced nutrition.",
            ),
            OverallStatus::NeedsAttention => {
                Some("Monitor growth closely; increase protein and vegetable intake.")
            }
            OverallStatus::OverweightRisk => {
                Some("Reduce ultra-processed food and sugary drinks.")
            }
            OverallStatus::Healthy => Some("Keep up the healthy diet and physical activity."),
            OverallStatus::IncompleteData => None,
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boundaries of the height-for-age "needs attention" band.
///
/// The band starts at -2 (inclusive). Its upper bound defaults to -1,
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderlineBand {
    pub upper: f64,
    pub upper_inclusive: bool,
}

impl Default for BorderlineBand {
    fn default() -> Self {
        Self {
            upper: DEFAULT_BORDERLINE_UPPER,
            upper_inclusive: false,
        }
    }
}

impl BorderlineBand {
    /// True if `z` falls inside the band.
    #[must_use]
    pub fn contains(&self, z: f64) -> bool {
        if z < Z_MODERATE {
            return false;
        }
        if self.upper_inclusive {
            z <= self.upper
        } else {
            z < self.upper
        }
    }
}

/// Combine per-indicator results into the headline status.
///
/// First match wins:
/// 1. a status is missing → `IncompleteData`
/// 2. height in the stunting range → `StuntingAlert`
/// 3. height Z inside the borderline band → `NeedsAttention`
/// 4. weight `ObesityRisk` → `OverweightRisk`
/// 5. otherwise → `Healthy`
#[must_use]
pub fn overall_status(
    height: Option<HeightStatus>,
    height_z: Option<f64>,
    weight: Option<WeightStatus>,
    band: &BorderlineBand,
) -> OverallStatus {
    let (Some(height), Some(weight)) = (height, weight) else {
        return OverallStatus::IncompleteData;
    };

    if height.is_stunted() {
        OverallStatus::StuntingAlert
    } else if height_z.is_some_and(|z| band.contains(z)) {
        OverallStatus::NeedsAttention
    } else if weight == WeightStatus::ObesityRisk {
        OverallStatus::OverweightRisk
    } else {
        OverallStatus::Healthy
    }
}

// =============================================================================
// TESTS
// =============================================================================
