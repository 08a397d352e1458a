//! # Evaluation Pipeline
//!
//! Age → reference lookup → Z-score → status, for one child.
//!
//! The classification policy is chosen explicitly by the caller through a
//! [`Strategy`]; the three policies give different labels for the same
//! child and are never combined.
//!
//! Evaluation is pure: it reads immutable tables and returns a value.
//! Accumulating results is the caller's job (see [`crate::store`]).

use crate::age::{Age, AgePolicy, calculate_age};
use crate::classify::{
    BorderlineBand, HeightStatus, HeightThresholdTable, MedianSdTable, OverallStatus,
    WeightStatus, classify_height_for_age, classify_weight_for_age, overall_status,
};
use crate::lms::indicator_z_score;
use crate::reference::{GrowthReference, ReferenceTable};
use crate::{ChildMeasurement, GrowthError, Indicator, MeasurementBounds};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// POLICY
// =============================================================================

/// Name of a classification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationPolicy {
    /// LMS Z-scores for both indicators.
    #[default]
    Lms,
    /// Raw height against age-bucketed thresholds; height only.
    HeightThreshold,
    /// Raw height against a per-year median/SD table; height only.
    MedianSd,
}

impl ClassificationPolicy {
    /// Kebab-case name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ClassificationPolicy::Lms => "lms",
            ClassificationPolicy::HeightThreshold => "height-threshold",
            ClassificationPolicy::MedianSd => "median-sd",
        }
    }
}

impl fmt::Display for ClassificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassificationPolicy {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lms" => Ok(ClassificationPolicy::Lms),
            "height-threshold" | "threshold" => Ok(ClassificationPolicy::HeightThreshold),
            "median-sd" | "median" => Ok(ClassificationPolicy::MedianSd),
            other => Err(GrowthError::InvalidInput(format!(
                "unknown policy: '{}' (use lms, height-threshold, median-sd)",
                other
            ))),
        }
    }
}

/// A policy together with the reference data it classifies against.
#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    Lms(&'a GrowthReference),
    HeightThreshold(&'a HeightThresholdTable),
    MedianSd(&'a MedianSdTable),
}

impl Strategy<'_> {
    /// The policy this strategy implements.
    #[must_use]
    pub fn policy(&self) -> ClassificationPolicy {
        match self {
            Strategy::Lms(_) => ClassificationPolicy::Lms,
            Strategy::HeightThreshold(_) => ClassificationPolicy::HeightThreshold,
            Strategy::MedianSd(_) => ClassificationPolicy::MedianSd,
        }
    }
}

// =============================================================================
// OPTIONS & RESULT
// =============================================================================

/// Tunables of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluationOptions {
    pub age_policy: AgePolicy,
    pub bounds: MeasurementBounds,
    pub borderline: BorderlineBand,
    /// Refuse reference rows further than this many months from the child's
    /// age. `None` always takes the nearest row.
    pub max_lookup_distance: Option<u32>,
    /// Apply the restricted-tail correction to weight-for-age Z-scores.
    pub weight_tail_adjustment: bool,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub policy: ClassificationPolicy,
    pub age: Age,
    pub age_months: u32,
    pub height_z: Option<f64>,
    pub weight_z: Option<f64>,
    pub height_status: Option<HeightStatus>,
    pub weight_status: Option<WeightStatus>,
    pub overall: OverallStatus,
}

/// Per-indicator scores produced by one strategy.
#[derive(Debug, Clone, Copy, Default)]
struct Scores {
    height_z: Option<f64>,
    height_status: Option<HeightStatus>,
    weight_z: Option<f64>,
    weight_status: Option<WeightStatus>,
}

// =============================================================================
// EVALUATOR
// =============================================================================

/// Runs the pipeline for one strategy and one set of options.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    strategy: Strategy<'a>,
    options: EvaluationOptions,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator.
    #[must_use]
    pub fn new(strategy: Strategy<'a>, options: EvaluationOptions) -> Self {
        Self { strategy, options }
    }

    /// The active options.
    #[must_use]
    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Classify one child as of `today`.
    ///
    /// # Errors
    /// - `InvalidInput` for implausible measurements or a future birth date
    ///   (checked before any table is touched)
    /// - `ReferenceDataMissing` if a required table was never loaded
    pub fn evaluate(
        &self,
        measurement: &ChildMeasurement,
        today: NaiveDate,
    ) -> Result<ClassificationResult, GrowthError> {
        self.options.bounds.validate()?;
        measurement.validate(&self.options.bounds, today)?;
        let age = calculate_age(measurement.birth_date, today, self.options.age_policy)?;

        let scores = match self.strategy {
            Strategy::Lms(reference) => self.lms_scores(reference, measurement, &age)?,
            Strategy::HeightThreshold(table) => Scores {
                height_status: Some(table.classify(age.whole_years(), measurement.height_cm)),
                ..Scores::default()
            },
            Strategy::MedianSd(table) => {
                let z = table.z_score(age.whole_years(), measurement.height_cm)?;
                Scores {
                    height_z: Some(z),
                    height_status: Some(classify_height_for_age(z)),
                    ..Scores::default()
                }
            }
        };

        let overall = overall_status(
            scores.height_status,
            scores.height_z,
            scores.weight_status,
            &self.options.borderline,
        );

        Ok(ClassificationResult {
            policy: self.strategy.policy(),
            age,
            age_months: age.total_months,
            height_z: scores.height_z,
            weight_z: scores.weight_z,
            height_status: scores.height_status,
            weight_status: scores.weight_status,
            overall,
        })
    }

    fn lms_scores(
        &self,
        reference: &GrowthReference,
        measurement: &ChildMeasurement,
        age: &Age,
    ) -> Result<Scores, GrowthError> {
        let hfa = reference.table(measurement.sex, Indicator::HeightForAge)?;
        let wfa = reference.table(measurement.sex, Indicator::WeightForAge)?;

        let height_z = self.indicator_z(hfa, Indicator::HeightForAge, measurement.height_cm, age)?;
        let weight_z = self.indicator_z(wfa, Indicator::WeightForAge, measurement.weight_kg, age)?;

        Ok(Scores {
            height_z,
            height_status: height_z.map(classify_height_for_age),
            weight_z,
            weight_status: weight_z.map(classify_weight_for_age),
        })
    }

    /// Z-score for one indicator, or `None` if no row resolves for the age.
    fn indicator_z(
        &self,
        table: &ReferenceTable,
        indicator: Indicator,
        value: f64,
        age: &Age,
    ) -> Result<Option<f64>, GrowthError> {
        let row = match table.lookup_within(age.total_months, self.options.max_lookup_distance) {
            Ok(row) => row,
            Err(GrowthError::LookupUnresolved { age_months }) => {
                tracing::warn!(
                    "No {} reference row within range for {} months",
                    indicator,
                    age_months
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let z = indicator_z_score(indicator, value, row, self.options.weight_tail_adjustment)?;
        Ok(Some(z))
    }
}

// =============================================================================
// TESTS
// =============================================================================
