//! # Primitives
//!
//! Compiled-in constants for the Tumbuh CORE.
//!
//! These values are defaults only; the app layer may override the
//! measurement bounds and the borderline band from configuration.

// =============================================================================
// MEASUREMENT BOUNDS
// =============================================================================

/// Smallest height accepted by the screening form, in centimeters.
pub const MIN_HEIGHT_CM: f64 = 50.0;

/// Largest height accepted by the screening form, in centimeters.
pub const MAX_HEIGHT_CM: f64 = 200.0;

/// Smallest weight accepted by the screening form, in kilograms.
pub const MIN_WEIGHT_KG: f64 = 10.0;

/// Largest weight accepted by the screening form, in kilograms.
pub const MAX_WEIGHT_KG: f64 = 100.0;

/// Lowest primary school class.
pub const MIN_SCHOOL_CLASS: u8 = 1;

/// Highest primary school class.
pub const MAX_SCHOOL_CLASS: u8 = 6;

// =============================================================================
// DAY-COUNT AGE APPROXIMATION
// =============================================================================

/// Days per year under the day-count age policy.
pub const DAY_COUNT_YEAR: i64 = 365;

/// Days per month under the day-count age policy.
pub const DAY_COUNT_MONTH: i64 = 30;

// =============================================================================
// Z-SCORE BANDS
// =============================================================================

/// Below this Z-score a child is severely stunted / severely underweight.
pub const Z_SEVERE: f64 = -3.0;

/// Below this Z-score a child is stunted / underweight.
pub const Z_MODERATE: f64 = -2.0;

/// Weight-for-age Z-scores above this indicate overweight risk.
pub const Z_OVERWEIGHT: f64 = 1.0;

/// Weight-for-age Z-scores above this indicate obesity risk.
pub const Z_OBESE: f64 = 2.0;

/// Default upper bound of the height-for-age "needs attention" band.
///
/// The band is `[Z_MODERATE, DEFAULT_BORDERLINE_UPPER)` unless configured
/// as inclusive.
pub const DEFAULT_BORDERLINE_UPPER: f64 = -1.0;

/// Magnitude beyond which the restricted weight tail adjustment applies.
pub const Z_TAIL: f64 = 3.0;
