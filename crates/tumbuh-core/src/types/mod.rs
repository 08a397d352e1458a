//! # Core Type Definitions
//!
//! This module contains the shared types of the classification pipeline:
//! - Cohort keys (`Sex`, `Indicator`)
//! - Input measurement (`ChildMeasurement`, `MeasurementBounds`)
//! - Error types (`GrowthError`)
//!
//! ## Determinism Guarantees
//!
//! All key types implement `Ord` so reference tables can live in a
//! `BTreeMap` and iterate in a fixed order.

use crate::primitives::{
    MAX_HEIGHT_CM, MAX_SCHOOL_CLASS, MAX_WEIGHT_KG, MIN_HEIGHT_CM, MIN_SCHOOL_CLASS, MIN_WEIGHT_KG,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// COHORT KEYS
// =============================================================================

/// Biological sex of the child. Selects the reference cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Lowercase code used in file names and logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Sex {
    type Err = GrowthError;

    /// Accepts English codes as well as the Indonesian form labels
    /// (`Laki-laki` / `Perempuan`, `L` / `P`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "boy" | "l" | "laki-laki" => Ok(Sex::Male),
            "female" | "f" | "girl" | "p" | "perempuan" => Ok(Sex::Female),
            other => Err(GrowthError::InvalidInput(format!("unknown sex: '{}'", other))),
        }
    }
}

/// Growth indicator (measurement type) of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Indicator {
    /// Height-for-age (HFA).
    HeightForAge,
    /// Weight-for-age (WFA).
    WeightForAge,
}

impl Indicator {
    /// Both indicators, in evaluation order.
    pub const ALL: [Indicator; 2] = [Indicator::HeightForAge, Indicator::WeightForAge];

    /// Short code ("hfa" / "wfa") used in reference file names.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Indicator::HeightForAge => "hfa",
            Indicator::WeightForAge => "wfa",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::HeightForAge => "height-for-age",
            Indicator::WeightForAge => "weight-for-age",
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Indicator {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hfa" | "height-for-age" | "height" => Ok(Indicator::HeightForAge),
            "wfa" | "weight-for-age" | "weight" => Ok(Indicator::WeightForAge),
            other => Err(GrowthError::InvalidInput(format!(
                "unknown indicator: '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// MEASUREMENT BOUNDS
// =============================================================================

/// Physical plausibility bounds for raw measurements.
///
/// Values outside `[min, max]` are rejected before any Z-score is computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeasurementBounds {
    pub height_min_cm: f64,
    pub height_max_cm: f64,
    pub weight_min_kg: f64,
    pub weight_max_kg: f64,
}

impl Default for MeasurementBounds {
    fn default() -> Self {
        Self {
            height_min_cm: MIN_HEIGHT_CM,
            height_max_cm: MAX_HEIGHT_CM,
            weight_min_kg: MIN_WEIGHT_KG,
            weight_max_kg: MAX_WEIGHT_KG,
        }
    }
}

impl MeasurementBounds {
    /// Check that the bounds themselves are usable.
    pub fn validate(&self) -> Result<(), GrowthError> {
        let pairs = [
            ("height", self.height_min_cm, self.height_max_cm),
            ("weight", self.weight_min_kg, self.weight_max_kg),
        ];
        for (what, min, max) in pairs {
            if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min > max {
                return Err(GrowthError::InvalidInput(format!(
                    "{} bounds must satisfy 0 < min <= max, got [{}, {}]",
                    what, min, max
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// CHILD MEASUREMENT
// =============================================================================

/// One child's measurements, as submitted for a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildMeasurement {
    /// Free text, may be empty.
    pub name: String,
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub height_cm: f64,
    pub weight_kg: f64,
    /// Primary school class (1-6), if recorded.
    #[serde(default)]
    pub school_class: Option<u8>,
}

impl ChildMeasurement {
    /// Create a measurement without a school class.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        sex: Sex,
        birth_date: NaiveDate,
        height_cm: f64,
        weight_kg: f64,
    ) -> Self {
        Self {
            name: name.into(),
            sex,
            birth_date,
            height_cm,
            weight_kg,
            school_class: None,
        }
    }

    /// Attach a school class.
    #[must_use]
    pub fn with_class(mut self, class: u8) -> Self {
        self.school_class = Some(class);
        self
    }

    /// Validate the measurement against `bounds` and the evaluation date.
    ///
    /// Returns `GrowthError::InvalidInput` if:
    /// - height or weight is not finite, not positive, or outside bounds
    /// - the birth date lies after `today`
    /// - the school class is outside 1-6
    pub fn validate(&self, bounds: &MeasurementBounds, today: NaiveDate) -> Result<(), GrowthError> {
        check_range(
            "height",
            "cm",
            self.height_cm,
            bounds.height_min_cm,
            bounds.height_max_cm,
        )?;
        check_range(
            "weight",
            "kg",
            self.weight_kg,
            bounds.weight_min_kg,
            bounds.weight_max_kg,
        )?;

        if self.birth_date > today {
            return Err(GrowthError::InvalidInput(format!(
                "birth date {} is after evaluation date {}",
                self.birth_date, today
            )));
        }

        if let Some(class) = self.school_class {
            if !(MIN_SCHOOL_CLASS..=MAX_SCHOOL_CLASS).contains(&class) {
                return Err(GrowthError::InvalidInput(format!(
                    "school class must be {}-{}, got {}",
                    MIN_SCHOOL_CLASS, MAX_SCHOOL_CLASS, class
                )));
            }
        }

        Ok(())
    }
}

fn check_range(what: &str, unit: &str, value: f64, min: f64, max: f64) -> Result<(), GrowthError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GrowthError::InvalidInput(format!(
            "{} must be a positive number, got {}",
            what, value
        )));
    }
    if value < min || value > max {
        return Err(GrowthError::InvalidInput(format!(
            "{} {} {} outside plausible range [{}, {}]",
            what, value, unit, min, max
        )));
    }
    Ok(())
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while classifying a child.
///
/// - No silent failures
/// - Nothing is retried: every error is deterministic for a given input
#[derive(Debug, Error)]
pub enum GrowthError {
    /// A measurement, date or LMS parameter is outside its domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A reference table was not loaded or is empty.
    #[error("Reference data missing: {0}")]
    ReferenceDataMissing(String),

    /// No usable reference row exists for the requested age.
    #[error("No reference row resolved for age {age_months} months")]
    LookupUnresolved { age_months: u32 },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn child(height: f64, weight: f64) -> ChildMeasurement {
        ChildMeasurement::new("Ani", Sex::Female, date(2016, 3, 10), height, weight)
    }

    #[test]
    fn sex_parses_form_labels() {
        assert_eq!("Laki-laki".parse::<Sex>().expect("parse"), Sex::Male);
        assert_eq!("P".parse::<Sex>().expect("parse"), Sex::Female);
        assert_eq!(" female ".parse::<Sex>().expect("parse"), Sex::Female);
        assert!(matches!(
            "x".parse::<Sex>(),
            Err(GrowthError::InvalidInput(_))
        ));
    }

    #[test]
    fn indicator_codes() {
        assert_eq!(Indicator::HeightForAge.code(), "hfa");
        assert_eq!("wfa".parse::<Indicator>().expect("parse"), Indicator::WeightForAge);
    }

    #[test]
    fn valid_measurement_accepted() {
        let today = date(2024, 6, 15);
        assert!(child(120.0, 22.0).validate(&MeasurementBounds::default(), today).is_ok());
    }

    #[test]
    fn negative_height_rejected() {
        let today = date(2024, 6, 15);
        let result = child(-5.0, 22.0).validate(&MeasurementBounds::default(), today);
        assert!(matches!(result, Err(GrowthError::InvalidInput(_))));
    }

    #[test]
    fn out_of_bounds_weight_rejected() {
        let today = date(2024, 6, 15);
        let result = child(120.0, 250.0).validate(&MeasurementBounds::default(), today);
        assert!(matches!(result, Err(GrowthError::InvalidInput(_))));
    }

    #[test]
    fn nan_rejected() {
        let today = date(2024, 6, 15);
        let result = child(f64::NAN, 22.0).validate(&MeasurementBounds::default(), today);
        assert!(matches!(result, Err(GrowthError::InvalidInput(_))));
    }

    #[test]
    fn future_birth_date_rejected() {
        let today = date(2015, 1, 1);
        let result = child(120.0, 22.0).validate(&MeasurementBounds::default(), today);
        assert!(matches!(result, Err(GrowthError::InvalidInput(_))));
    }

    #[test]
    fn school_class_range() {
        let today = date(2024, 6, 15);
        let bounds = MeasurementBounds::default();
        assert!(child(120.0, 22.0).with_class(6).validate(&bounds, today).is_ok());
        assert!(child(120.0, 22.0).with_class(7).validate(&bounds, today).is_err());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let bounds = MeasurementBounds {
            height_min_cm: 200.0,
            height_max_cm: 50.0,
            ..MeasurementBounds::default()
        };
        assert!(bounds.validate().is_err());
    }
}
