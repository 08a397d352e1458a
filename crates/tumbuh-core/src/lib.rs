//! # tumbuh-core
//!
//! The growth classification engine for Tumbuh - THE LOGIC.
//!
//! Classifies a child's nutritional status from age, sex, height and weight
//! against WHO-style LMS reference tables:
//!
//! ```text
//! ChildMeasurement ──▶ age ──▶ reference lookup (×2) ──▶ LMS Z (×2) ──▶ status (×2)
//!                                                                         │
//!                                                    ClassificationResult ◀┘
//! ```
//!
//! ## Architectural Constraints
//!
//! - Pure and synchronous: no async, no network
//! - Reference tables are immutable once built
//! - Evaluation returns a value; accumulating results is the caller's job
//! - Each classification policy is an explicit, named strategy

// =============================================================================
// MODULES
// =============================================================================

pub mod age;
pub mod classify;
pub mod evaluate;
pub mod lms;
pub mod primitives;
pub mod reference;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{ChildMeasurement, GrowthError, Indicator, MeasurementBounds, Sex};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use age::{Age, AgePolicy, calculate_age};
pub use classify::{
    BorderlineBand, HeightStatus, HeightThreshold, HeightThresholdTable, MedianSd, MedianSdTable,
    OverallStatus, WeightStatus, classify_height_for_age, classify_weight_for_age, overall_status,
};
pub use evaluate::{
    ClassificationPolicy, ClassificationResult, EvaluationOptions, Evaluator, Strategy,
};
pub use lms::{centile_value, indicator_z_score, lms_z_score, restricted_z_score, z_score};
pub use reference::{GrowthReference, GrowthReferenceRow, ReferenceTable, nearest_row};

// =============================================================================
// RE-EXPORTS: Result Store
// =============================================================================

pub use store::{
    ClassRecap, CsvStore, EvaluationRecord, MemoryStore, ResultStore, recap_by_class,
};
